use super::Loading;

#[derive(Debug)]
pub(crate) struct BelongsTo {
    /// Relation field type, e.g. `BelongsTo<User>`
    pub(crate) ty: syn::Type,

    /// `(source field, referenced target field)` pairs
    pub(crate) foreign_key: Vec<(syn::Ident, syn::Ident)>,

    pub(crate) loading: Option<Loading>,
}

impl BelongsTo {
    pub(super) fn from_ast(
        attr: &syn::Attribute,
        ty: &syn::Type,
        names: &[syn::Ident],
    ) -> syn::Result<Self> {
        let mut fk_sources: Vec<syn::Ident> = vec![];
        let mut fk_targets: Vec<syn::Ident> = vec![];
        let mut loading = None;

        attr.parse_nested_meta(|meta| {
            if Loading::parse(&meta, &mut loading)? {
                return Ok(());
            }

            if meta.path.is_ident("key") {
                let value = meta.value()?;
                fk_sources.push(value.parse()?);
            } else if meta.path.is_ident("references") {
                let value = meta.value()?;
                fk_targets.push(value.parse()?);
            } else {
                return Err(syn::Error::new_spanned(
                    &meta.path,
                    "expected `key`, `references`, `eager`, or `lazy`",
                ));
            }

            Ok(())
        })?;

        if fk_sources.len() != fk_targets.len() {
            return Err(syn::Error::new_spanned(
                attr,
                "number of `key` and `references` attributes must match",
            ));
        }

        if fk_sources.is_empty() {
            return Err(syn::Error::new_spanned(
                attr,
                "expected at least one `key` and `references` attribute",
            ));
        }

        for source in &fk_sources {
            if !names.contains(source) {
                return Err(syn::Error::new_spanned(
                    source,
                    format!("unknown field `{source}`"),
                ));
            }
        }

        Ok(Self {
            ty: ty.clone(),
            foreign_key: fk_sources.into_iter().zip(fk_targets).collect(),
            loading,
        })
    }
}
