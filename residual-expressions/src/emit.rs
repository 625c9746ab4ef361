use crate::Pattern;
use proc_macro2::TokenStream;
use quote::quote;

impl Pattern {
    /// Convert this pattern into rust code that builds the matching expression.
    /// `krate` is the path under which `Expression` is reachable from the call site;
    /// names in the pattern become clones of the variables with the same name.
    pub fn emit(&self, krate: &TokenStream) -> TokenStream {
        let expression = quote!(#krate::Expression);

        match self {
            Pattern::Fail => quote!(#expression::fail()),
            Pattern::Accept => quote!(#expression::accept()),
            Pattern::Any => quote!(#expression::any()),
            Pattern::Name(name) => quote!(::core::clone::Clone::clone(&#name)),
            Pattern::Star(p) => {
                let p = p.emit(krate);
                quote!(#expression::star(#p))
            }
            Pattern::Plus(p) => {
                let p = p.emit(krate);
                quote!(#expression::plus(#p))
            }
            Pattern::Optional(p) => {
                let p = p.emit(krate);
                quote!(#expression::optional(#p))
            }
            Pattern::Complement(p) => {
                let p = p.emit(krate);
                quote!(#expression::complement(#p))
            }
            Pattern::Concat(l, r) => {
                let (l, r) = (l.emit(krate), r.emit(krate));
                quote!(#expression::concat(#l, #r))
            }
            Pattern::Alternate(l, r) => {
                let (l, r) = (l.emit(krate), r.emit(krate));
                quote!(#expression::alternate(#l, #r))
            }
            Pattern::Intersect(l, r) => {
                let (l, r) = (l.emit(krate), r.emit(krate));
                quote!(#expression::intersect(#l, #r))
            }
            Pattern::Difference(l, r) => {
                let (l, r) = (l.emit(krate), r.emit(krate));
                quote!(#expression::difference(#l, #r))
            }
        }
    }
}
