pub(crate) mod layers;
pub(crate) mod layout;
