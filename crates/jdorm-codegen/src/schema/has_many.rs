use super::Loading;

#[derive(Debug)]
pub(crate) struct HasMany {
    /// Relation field type, e.g. `HasMany<Post>`
    pub(crate) ty: syn::Type,

    /// `belongs_to` field on the target that the relation pairs with
    pub(crate) pair: Option<syn::Ident>,

    pub(crate) loading: Option<Loading>,
}

impl HasMany {
    pub(super) fn from_ast(attr: &syn::Attribute, ty: &syn::Type) -> syn::Result<Self> {
        let (pair, loading) = parse_inverse(attr)?;

        Ok(Self {
            ty: ty.clone(),
            pair,
            loading,
        })
    }
}

/// Arguments shared by `#[has_many]` and `#[has_one]`.
pub(super) fn parse_inverse(
    attr: &syn::Attribute,
) -> syn::Result<(Option<syn::Ident>, Option<Loading>)> {
    let mut pair = None;
    let mut loading = None;

    if let syn::Meta::List(_) = &attr.meta {
        attr.parse_nested_meta(|meta| {
            if Loading::parse(&meta, &mut loading)? {
                return Ok(());
            }

            if meta.path.is_ident("pair") {
                let value = meta.value()?;
                pair = Some(value.parse()?);
            } else {
                return Err(syn::Error::new_spanned(
                    &meta.path,
                    "expected `pair`, `eager`, or `lazy`",
                ));
            }

            Ok(())
        })?;
    }

    Ok((pair, loading))
}
