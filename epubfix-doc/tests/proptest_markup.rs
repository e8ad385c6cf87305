//! Robustness: the markup layer must never panic, whatever bytes a package
//! throws at it, and a declined edit must never alter the source.

use epubfix_doc::{MarkupDoc, check_well_formed};
use proptest::prelude::*;

proptest! {
    #[test]
    fn well_formed_check_never_panics(content in ".{0,256}") {
        let _ = check_well_formed(&content, "application/xhtml+xml");
        let _ = check_well_formed(&content, "text/html");
    }

    #[test]
    fn declined_edit_is_identity(content in "[a-zA-Z0-9<>/= \"']{0,256}") {
        if let Ok(mut doc) = MarkupDoc::parse(&content, "text/html") {
            let before = doc.source().to_string();
            let changed = doc.edit_elements(None, |_| None).expect("edit");
            prop_assert_eq!(changed, 0);
            prop_assert_eq!(doc.source(), before.as_str());
        }
    }

    #[test]
    fn strict_parse_never_panics(content in ".{0,256}") {
        let _ = MarkupDoc::parse(&content, "application/xhtml+xml");
    }
}
