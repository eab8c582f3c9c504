pub(crate) mod decode;
pub(crate) mod fontbook;
pub(crate) mod fonts;
pub(crate) mod store;
pub(crate) mod woff;
