use super::*;
use crate::foundation::testfont::minimal_ttf;

#[test]
fn family_list_parsing_keeps_order_and_generics() {
    assert_eq!(
        parse_family_list("'Noto Nastaliq Urdu', serif"),
        vec![
            FamilyName::Named("Noto Nastaliq Urdu".into()),
            FamilyName::Serif
        ]
    );
    assert_eq!(
        parse_family_list("\"Serif\", sans-serif , ,"),
        vec![FamilyName::Named("Serif".into()), FamilyName::SansSerif]
    );
    assert!(parse_family_list("  ").is_empty());
}

#[test]
fn resolves_named_family_from_loaded_bytes() {
    let mut book = FontBook::new();
    book.load_bytes(minimal_ttf("Book Test"));
    assert_eq!(book.len(), 1);

    let font = book.resolve("'Book Test', serif", 400, None).unwrap();
    assert_eq!(font.family, "Book Test");
    assert_eq!(font.index, 0);

    let again = book.resolve("'Book Test'", 700, None).unwrap();
    assert!(Arc::ptr_eq(&font.bytes, &again.bytes));
}

#[test]
fn installed_face_wins_and_empty_book_resolves_nothing() {
    let mut book = FontBook::new();
    assert!(book.resolve("'Amiri', serif", 400, None).is_none());

    let face = InstalledFace::from_bytes(minimal_ttf("Runtime")).unwrap();
    let font = book.resolve("\"Runtime Label\"", 400, Some(&face)).unwrap();
    assert_eq!(font.family, "Runtime");
}

#[test]
fn missing_directories_are_ignored() {
    let book = FontBook::load(&[PathBuf::from("/definitely/not/here")], false);
    assert!(book.is_empty());
}
