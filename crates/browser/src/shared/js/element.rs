pub const ELEMENT_EXISTS: &str = r#"
(selector) => document.querySelector(selector) !== null
"#;
