mod entity;
mod mapping;

use crate::schema::Model;

use proc_macro2::TokenStream;
use quote::quote;

struct Expand<'a> {
    /// The entity being expanded
    model: &'a Model,

    /// Path prefix for jdorm types
    jdorm: TokenStream,
}

pub(super) fn entity(model: &Model) -> TokenStream {
    let expand = Expand {
        model,
        jdorm: quote!(_jdorm::codegen_support),
    };

    wrap_in_const(expand.expand_entity_impl())
}

fn wrap_in_const(code: TokenStream) -> TokenStream {
    quote! {
        const _: () = {
            use jdorm as _jdorm;
            #code
        };
    }
}
