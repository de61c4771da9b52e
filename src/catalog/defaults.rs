use super::types::FormMap;

const FORMS_BASE: &str = "https://www.uscis.gov/sites/default/files/document/forms";

/// Built-in seed table used when no catalog has been persisted yet
const DEFAULT_FORM_FILES: &[(&str, &str)] = &[
    ("I-765", "i-765.pdf"),
    ("I-485", "i-485.pdf"),
    ("I-485A", "i-485supa.pdf"),
    ("I-130", "i-130.pdf"),
    ("I-130A", "i-130a.pdf"),
    ("I-821D", "i-821d.pdf"),
    ("I-821", "i-821.pdf"),
    ("I-134", "i-134.pdf"),
    ("I-140", "i-140.pdf"),
    ("I-129F", "i-129f.pdf"),
    ("I-131", "i-131.pdf"),
    ("I-539", "i-539.pdf"),
    ("I-589", "i-589.pdf"),
    ("I-612", "i-612.pdf"),
    ("I-751", "i-751.pdf"),
    ("I-817", "i-817.pdf"),
    ("I-824", "i-824.pdf"),
    ("I-864", "i-864.pdf"),
    ("I-864A", "i-864a.pdf"),
    ("I-864EZ", "i-864ez.pdf"),
    // I-864P has no standalone PDF; it points at the I-864 file
    ("I-864P", "i-864.pdf"),
    ("I-881", "i-881.pdf"),
    ("I-912", "i-912.pdf"),
    ("N-400", "n-400.pdf"),
    ("N-565", "n-565.pdf"),
    ("N-600", "n-600.pdf"),
    ("I-90", "i-90.pdf"),
    ("AR-11", "ar-11.pdf"),
    ("EOIR-29", "eoir-29.pdf"),
    ("G-325A", "g-325a.pdf"),
    ("G-639", "g-639.pdf"),
    ("G-1055", "g-1055.pdf"),
    ("G-1450", "g-1450.pdf"),
];

/// Number of entries in the built-in seed table
pub const DEFAULT_FORM_COUNT: usize = DEFAULT_FORM_FILES.len();

/// Get the built-in seed table as a form map
pub fn default_forms() -> FormMap {
    DEFAULT_FORM_FILES
        .iter()
        .map(|(identifier, file)| (identifier.to_string(), format!("{FORMS_BASE}/{file}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_forms_are_unique() {
        assert_eq!(default_forms().len(), DEFAULT_FORM_COUNT);
        assert_eq!(DEFAULT_FORM_COUNT, 33);
    }

    #[test]
    fn test_default_forms_are_absolute_pdf_links() {
        for (identifier, url) in default_forms() {
            assert!(url.starts_with("https://www.uscis.gov/sites/"), "{identifier}");
            assert!(url.ends_with(".pdf"), "{identifier}");
        }
        assert_eq!(
            default_forms()["I-765"],
            "https://www.uscis.gov/sites/default/files/document/forms/i-765.pdf"
        );
    }
}
