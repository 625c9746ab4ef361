use proc_macro::TokenStream;
use quote::quote;
use residual_expressions::Pattern;
use syn::parse_macro_input;

#[proc_macro]
pub fn pattern(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as Pattern);
    input.emit(&quote!(::residual)).into()
}
