extern crate proc_macro;

use proc_macro::TokenStream;

#[proc_macro_derive(Entity, attributes(key, auto, column, table, has_many, has_one, belongs_to))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    match jdorm_codegen::generate(input.into()) {
        Ok(output) => output.into(),
        Err(e) => e.to_compile_error().into(),
    }
}
