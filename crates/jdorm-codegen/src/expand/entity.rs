use super::Expand;
use crate::schema::FieldTy;

use proc_macro2::{Literal, TokenStream};
use quote::quote;

impl Expand<'_> {
    pub(super) fn expand_entity_impl(&self) -> TokenStream {
        let jdorm = &self.jdorm;
        let model_ident = &self.model.ident;
        let name = &self.model.name.declared;
        let mapping = self.expand_mapping();
        let to_record = self.expand_to_record();
        let load = self.expand_load();
        let assign_arms = self.expand_assign_arms();
        let relation_arms = self.expand_relation_arms();

        quote! {
            impl #jdorm::Entity for #model_ident {
                const NAME: &'static str = #name;

                fn mapping() -> #jdorm::Mapping {
                    #mapping
                }

                fn to_record(&self) -> #jdorm::ValueRecord {
                    #to_record
                }

                fn load(record: #jdorm::ValueRecord) -> #jdorm::Result<Self> {
                    #load
                }

                fn assign(&mut self, field: usize, value: #jdorm::Value) -> #jdorm::Result<()> {
                    match field {
                        #assign_arms
                        _ => {
                            return #jdorm::Result::Err(#jdorm::Error::from_args(
                                format_args!("`{}` has no field {}", #name, field)
                            ));
                        }
                    }

                    #jdorm::Result::Ok(())
                }

                fn relation(
                    &self,
                    index: usize,
                ) -> #jdorm::Option<#jdorm::Arc<dyn #jdorm::RelationSlot>> {
                    match index {
                        #relation_arms
                        _ => #jdorm::Option::None,
                    }
                }
            }
        }
    }

    fn expand_to_record(&self) -> TokenStream {
        let jdorm = &self.jdorm;
        let values = self.model.columns().map(|field| {
            let ident = &field.ident;
            quote!(#jdorm::Primitive::to_value(&self.#ident))
        });

        quote! {
            #jdorm::ValueRecord::from_vec(::std::vec![#( #values, )*])
        }
    }

    fn expand_load(&self) -> TokenStream {
        let jdorm = &self.jdorm;

        let columns = self.model.columns().map(|field| {
            let ident = &field.ident;
            let FieldTy::Primitive(ty) = &field.ty else {
                return TokenStream::new();
            };

            quote! {
                let #ident = <#ty as #jdorm::Primitive>::load(
                    __jdorm_values.next().unwrap_or_default(),
                )?;
            }
        });

        let column_idents = self.model.columns().map(|field| &field.ident);
        let relation_idents = self.model.relations().map(|field| &field.ident);

        quote! {
            let mut __jdorm_values = record.into_vec().into_iter();
            #( #columns )*

            #jdorm::Result::Ok(Self {
                #( #column_idents, )*
                #( #relation_idents: #jdorm::Default::default(), )*
            })
        }
    }

    fn expand_assign_arms(&self) -> TokenStream {
        let jdorm = &self.jdorm;

        let arms = self.model.columns().enumerate().map(|(index, field)| {
            let index = Literal::usize_unsuffixed(index);
            let ident = &field.ident;
            let FieldTy::Primitive(ty) = &field.ty else {
                return TokenStream::new();
            };

            quote! {
                #index => self.#ident = <#ty as #jdorm::Primitive>::load(value)?,
            }
        });

        quote!(#( #arms )*)
    }

    fn expand_relation_arms(&self) -> TokenStream {
        let jdorm = &self.jdorm;

        let arms = self.model.relations().enumerate().map(|(index, field)| {
            let index = Literal::usize_unsuffixed(index);
            let ident = &field.ident;

            quote! {
                #index => #jdorm::Option::Some(#jdorm::Relation::slot(&self.#ident)),
            }
        });

        quote!(#( #arms )*)
    }
}
