use super::{ErrorSet, Field, ModelAttr, Name};

#[derive(Debug)]
pub(crate) struct Model {
    /// Entity name
    pub(crate) name: Name,

    /// Type identifier
    pub(crate) ident: syn::Ident,

    /// Fields in declared order
    pub(crate) fields: Vec<Field>,

    /// Optional table to map the entity to
    pub(crate) table: Option<syn::LitStr>,
}

impl Model {
    pub(crate) fn from_ast(ast: &syn::ItemStruct) -> syn::Result<Self> {
        let syn::Fields::Named(node) = &ast.fields else {
            return Err(syn::Error::new_spanned(
                &ast.fields,
                "entity fields must be named",
            ));
        };

        if !ast.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &ast.generics,
                "entity generics are not supported",
            ));
        }

        let names: Vec<_> = node
            .named
            .iter()
            .filter_map(|field| field.ident.clone())
            .collect();

        let mut model_attr = ModelAttr::default();
        let mut fields = vec![];
        let mut errs = ErrorSet::new();

        if let Err(err) = model_attr.populate_from_ast(&ast.attrs) {
            errs.push(err);
        }

        for node in node.named.iter() {
            match Field::from_ast(node, &ast.ident, &names) {
                Ok(field) => fields.push(field),
                Err(err) => errs.push(err),
            }
        }

        if let Some(err) = errs.collect() {
            return Err(err);
        }

        if !fields.iter().any(|field| field.attrs.key.is_some()) {
            return Err(syn::Error::new_spanned(
                ast,
                "entity must have at least one field-level `#[key]` attribute",
            ));
        }

        Ok(Self {
            name: Name::from_ident(&ast.ident),
            ident: ast.ident.clone(),
            fields,
            table: model_attr.table,
        })
    }

    pub(crate) fn columns(&self) -> impl Iterator<Item = &super::Field> {
        self.fields.iter().filter(|field| !field.ty.is_relation())
    }

    pub(crate) fn relations(&self) -> impl Iterator<Item = &super::Field> {
        self.fields.iter().filter(|field| field.ty.is_relation())
    }
}
