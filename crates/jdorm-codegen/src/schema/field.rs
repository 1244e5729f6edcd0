use super::{BelongsTo, ErrorSet, HasMany, HasOne, Name};

#[derive(Debug)]
pub(crate) struct Field {
    /// Rust field identifier
    pub(crate) ident: syn::Ident,

    pub(crate) name: Name,

    pub(crate) attrs: FieldAttr,

    pub(crate) ty: FieldTy,
}

#[derive(Debug, Default)]
pub(crate) struct FieldAttr {
    /// Set if the field is annotated with `#[key]`
    pub(crate) key: Option<syn::Attribute>,

    /// Set if the field is annotated with `#[auto]`
    pub(crate) auto: Option<syn::Attribute>,

    /// Database column name: `#[column("name")]`
    pub(crate) column: Option<syn::LitStr>,
}

#[derive(Debug)]
pub(crate) enum FieldTy {
    Primitive(syn::Type),
    BelongsTo(BelongsTo),
    HasMany(HasMany),
    HasOne(HasOne),
}

impl FieldTy {
    pub(crate) fn is_relation(&self) -> bool {
        !matches!(self, Self::Primitive(..))
    }
}

impl Field {
    pub(super) fn from_ast(
        field: &syn::Field,
        model_ident: &syn::Ident,
        names: &[syn::Ident],
    ) -> syn::Result<Self> {
        let Some(ident) = &field.ident else {
            return Err(syn::Error::new_spanned(field, "entity fields must be named"));
        };

        let mut errs = ErrorSet::new();
        let mut attrs = FieldAttr::default();
        let mut ty = None;

        for attr in &field.attrs {
            if attr.path().is_ident("key") {
                if attrs.key.is_some() {
                    errs.push(syn::Error::new_spanned(attr, "duplicate #[key] attribute"));
                } else {
                    attrs.key = Some(attr.clone());
                }
            } else if attr.path().is_ident("auto") {
                if attrs.auto.is_some() {
                    errs.push(syn::Error::new_spanned(attr, "duplicate #[auto] attribute"));
                } else {
                    attrs.auto = Some(attr.clone());
                }
            } else if attr.path().is_ident("column") {
                if attrs.column.is_some() {
                    errs.push(syn::Error::new_spanned(attr, "duplicate #[column] attribute"));
                } else {
                    match attr.parse_args::<syn::LitStr>() {
                        Ok(lit) => attrs.column = Some(lit),
                        Err(err) => errs.push(err),
                    }
                }
            } else if attr.path().is_ident("belongs_to") {
                if ty.is_some() {
                    errs.push(syn::Error::new_spanned(
                        attr,
                        "field has more than one relation attribute",
                    ));
                } else {
                    ty = Some(FieldTy::BelongsTo(BelongsTo::from_ast(attr, &field.ty, names)?));
                }
            } else if attr.path().is_ident("has_many") {
                if ty.is_some() {
                    errs.push(syn::Error::new_spanned(
                        attr,
                        "field has more than one relation attribute",
                    ));
                } else {
                    ty = Some(FieldTy::HasMany(HasMany::from_ast(attr, &field.ty)?));
                }
            } else if attr.path().is_ident("has_one") {
                if ty.is_some() {
                    errs.push(syn::Error::new_spanned(
                        attr,
                        "field has more than one relation attribute",
                    ));
                } else {
                    ty = Some(FieldTy::HasOne(HasOne::from_ast(attr, &field.ty)?));
                }
            }
        }

        if ty.is_some() {
            for attr in [&attrs.key, &attrs.auto].into_iter().flatten() {
                errs.push(syn::Error::new_spanned(
                    attr,
                    "relation fields cannot be keys or generated",
                ));
            }

            if let Some(column) = &attrs.column {
                errs.push(syn::Error::new_spanned(
                    column,
                    "relation fields are not columns",
                ));
            }
        }

        if let (Some(auto), None) = (&attrs.auto, &attrs.key) {
            errs.push(syn::Error::new_spanned(
                auto,
                "#[auto] is only supported on #[key] fields",
            ));
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        let mut ty = ty.unwrap_or_else(|| FieldTy::Primitive(field.ty.clone()));

        match &mut ty {
            FieldTy::BelongsTo(rel) => rewrite_self(&mut rel.ty, model_ident),
            FieldTy::HasMany(rel) => rewrite_self(&mut rel.ty, model_ident),
            FieldTy::HasOne(rel) => rewrite_self(&mut rel.ty, model_ident),
            FieldTy::Primitive(ty) => rewrite_self(ty, model_ident),
        }

        Ok(Self {
            ident: ident.clone(),
            name: Name::from_ident(ident),
            attrs,
            ty,
        })
    }
}

/// Generated code lives outside the type's impl scope; spell `Self` out.
fn rewrite_self(ty: &mut syn::Type, model: &syn::Ident) {
    use syn::visit_mut::VisitMut;

    struct RewriteSelf<'a>(&'a syn::Ident);

    impl VisitMut for RewriteSelf<'_> {
        fn visit_path_mut(&mut self, path: &mut syn::Path) {
            syn::visit_mut::visit_path_mut(self, path);

            if path.is_ident("Self") {
                path.segments[0].ident = self.0.clone();
            }
        }
    }

    RewriteSelf(model).visit_type_mut(ty);
}
