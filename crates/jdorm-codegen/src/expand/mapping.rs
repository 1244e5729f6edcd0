use super::Expand;
use crate::schema::{Field, FieldTy, Loading};

use proc_macro2::TokenStream;
use quote::quote;

impl Expand<'_> {
    /// Body of `Entity::mapping`.
    pub(super) fn expand_mapping(&self) -> TokenStream {
        let jdorm = &self.jdorm;
        let name = &self.model.name.declared;

        let table = self.model.table.as_ref().map(|table| quote!(.table(#table)));
        let fields = self.model.columns().map(|field| self.expand_field_decl(field));
        let relations = self.model.relations().map(|field| self.expand_relation_decl(field));

        quote! {
            #jdorm::Mapping::new(#name)
                #table
                #( .field(#fields) )*
                #( .relation(#relations) )*
        }
    }

    fn expand_field_decl(&self, field: &Field) -> TokenStream {
        let jdorm = &self.jdorm;
        let name = &field.name.declared;

        let FieldTy::Primitive(ty) = &field.ty else {
            return TokenStream::new();
        };

        let column = field.attrs.column.as_ref().map(|column| quote!(.column(#column)));
        let primary_key = field.attrs.key.as_ref().map(|_| quote!(.primary_key()));
        let generated = field.attrs.auto.as_ref().map(|_| quote!(.generated()));

        quote! {{
            let field = #jdorm::FieldDecl::new(#name, <#ty as #jdorm::Primitive>::TYPE)
                #column
                #primary_key
                #generated;

            if <#ty as #jdorm::Primitive>::NULLABLE {
                field.nullable()
            } else {
                field
            }
        }}
    }

    fn expand_relation_decl(&self, field: &Field) -> TokenStream {
        let jdorm = &self.jdorm;
        let name = &field.name.declared;

        let (ty, foreign_key, pair, loading) = match &field.ty {
            FieldTy::BelongsTo(rel) => {
                let foreign_key = rel.foreign_key.iter().map(|(source, target)| {
                    let source = source.to_string();
                    let target = target.to_string();
                    quote!(.foreign_key(#source, #target))
                });
                (&rel.ty, quote!(#(#foreign_key)*), None, rel.loading)
            }
            FieldTy::HasMany(rel) => (&rel.ty, quote!(), rel.pair.as_ref(), rel.loading),
            FieldTy::HasOne(rel) => (&rel.ty, quote!(), rel.pair.as_ref(), rel.loading),
            FieldTy::Primitive(_) => return TokenStream::new(),
        };

        let pair = pair.map(|pair| {
            let pair = pair.to_string();
            quote!(.pair(#pair))
        });

        let loading = loading.map(|loading| match loading {
            Loading::Eager => quote!(.loading(#jdorm::LoadingPolicy::Eager)),
            Loading::Lazy => quote!(.loading(#jdorm::LoadingPolicy::Lazy)),
        });

        quote! {
            #jdorm::RelationDecl::new(
                #name,
                <#ty as #jdorm::Relation>::KIND,
                <<#ty as #jdorm::Relation>::Target as #jdorm::Entity>::NAME,
            )
            #foreign_key
            #pair
            #loading
        }
    }
}
