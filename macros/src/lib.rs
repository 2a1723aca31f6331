use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

/// Derives `bevy_hsm::HsmEvent` for a client event enum.
///
/// The completion event is the variant marked `#[completion]`, or a unit
/// variant literally named `None` when no attribute is present.
///
/// ```ignore
/// #[derive(HsmEvent, Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Evt {
///     #[completion]
///     None,
///     First,
///     Second,
/// }
/// ```
#[proc_macro_derive(HsmEvent, attributes(completion))]
pub fn derive_hsm_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let data = match &input.data {
        Data::Enum(data) => data,
        _ => {
            return syn::Error::new_spanned(&input.ident, "HsmEvent can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    let marked = data.variants.iter().find(|variant| {
        variant
            .attrs
            .iter()
            .any(|attr| attr.path().is_ident("completion"))
    });

    let completion = marked.or_else(|| data.variants.iter().find(|v| v.ident == "None"));

    let Some(completion) = completion else {
        return syn::Error::new_spanned(
            &input.ident,
            "HsmEvent needs a completion variant: mark one with #[completion] or name it `None`",
        )
        .to_compile_error()
        .into();
    };

    if !matches!(completion.fields, Fields::Unit) {
        return syn::Error::new_spanned(
            &completion.ident,
            "the completion variant must be a unit variant",
        )
        .to_compile_error()
        .into();
    }

    let variant = &completion.ident;

    let expanded = quote! {
        impl bevy_hsm::HsmEvent for #name {
            fn completion() -> Self {
                Self::#variant
            }
        }
    };

    TokenStream::from(expanded)
}
