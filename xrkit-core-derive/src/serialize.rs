use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemStruct;

use crate::field::FieldInfo;

pub fn derive_serialize_impl(st: ItemStruct) -> syn::Result<TokenStream> {
    let mut stmts = vec![];
    for (i, field) in st.fields.iter().enumerate() {
        let info = FieldInfo::parse(i, field)?;
        let error = info.error_message("serialize", &st.ident);
        let member = &info.member;

        let expr = if info.serialized_when.is_some() {
            // The condition is only evaluated on the read side; here presence decides.
            quote! {
                if let ::std::option::Option::Some(value) = &self.#member {
                    ::xrkit_core::binary::Serialize::serialize(value, sink)
                } else {
                    ::std::result::Result::Ok(())
                }
            }
        } else {
            quote! {
                ::xrkit_core::binary::Serialize::serialize(&self.#member, sink)
            }
        };
        stmts.push(quote! {
            ::xrkit_core::binary::ResultContextExt::context(#expr, #error)?;
        });
    }

    let type_name = st.ident;
    let (impl_generics, type_generics, where_clause) = st.generics.split_for_impl();
    let stmts = TokenStream::from_iter(stmts);

    Ok(quote! {
        impl #impl_generics ::xrkit_core::binary::Serialize for #type_name #type_generics #where_clause {
            fn serialize(
                &self,
                sink: &mut (impl ::xrkit_core::binary::Sink + ?Sized),
            ) -> ::std::result::Result<(), ::xrkit_core::binary::Error> {
                #stmts
                ::std::result::Result::Ok(())
            }
        }
    })
}
