#[derive(Debug)]
pub(crate) struct Name {
    /// Name as declared, without a raw-identifier prefix
    pub(crate) declared: String,
}

impl Name {
    pub(crate) fn from_ident(ident: &syn::Ident) -> Self {
        let declared = ident.to_string();
        let declared = declared.strip_prefix("r#").unwrap_or(&declared).to_string();
        Self { declared }
    }
}
