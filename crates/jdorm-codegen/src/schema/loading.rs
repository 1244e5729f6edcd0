/// `eager` / `lazy` flag on a relation attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Loading {
    Eager,
    Lazy,
}

impl Loading {
    /// Parse the flag if `meta` is one. Returns `Ok(false)` for other keys.
    pub(super) fn parse(
        meta: &syn::meta::ParseNestedMeta<'_>,
        slot: &mut Option<Loading>,
    ) -> syn::Result<bool> {
        let loading = if meta.path.is_ident("eager") {
            Loading::Eager
        } else if meta.path.is_ident("lazy") {
            Loading::Lazy
        } else {
            return Ok(false);
        };

        if slot.is_some() {
            return Err(meta.error("loading policy specified more than once"));
        }

        *slot = Some(loading);
        Ok(true)
    }
}
