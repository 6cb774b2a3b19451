pub const CHECK_LOADING: &str = r#"
() => ({
    readyState: document.readyState,
    resourceCount: performance.getEntriesByType('resource').length
})
"#;
