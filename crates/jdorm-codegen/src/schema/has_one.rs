use super::{has_many::parse_inverse, Loading};

#[derive(Debug)]
pub(crate) struct HasOne {
    pub(crate) ty: syn::Type,
    pub(crate) pair: Option<syn::Ident>,
    pub(crate) loading: Option<Loading>,
}

impl HasOne {
    pub(super) fn from_ast(attr: &syn::Attribute, ty: &syn::Type) -> syn::Result<Self> {
        let (pair, loading) = parse_inverse(attr)?;

        Ok(Self {
            ty: ty.clone(),
            pair,
            loading,
        })
    }
}
