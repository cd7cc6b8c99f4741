//! `rule!` parsing and expansion.

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Ident, LitStr, Result, Token, bracketed};

use crate::deadline::Deadline;

/// What the rule matches.
pub enum RuleBody {
    /// Verbatim literal.
    Exact(LitStr),
    /// Regex alternatives plus required substrings.
    Patterns {
        patterns: Vec<LitStr>,
        required: Vec<LitStr>,
    },
    /// Every substring must appear.
    Substrings(Vec<LitStr>),
}

/// The `rule!` macro input.
pub struct RuleInput {
    pub body: RuleBody,
    pub deadline: Option<Deadline>,
}

fn string_list(input: ParseStream, what: &str, keyword: &Ident) -> Result<Vec<LitStr>> {
    let content;
    bracketed!(content in input);
    let items: Punctuated<LitStr, Token![,]> = Punctuated::parse_terminated(&content)?;
    if items.is_empty() {
        return Err(syn::Error::new(
            keyword.span(),
            format!("`{keyword}` needs at least one {what}"),
        ));
    }
    Ok(items.into_iter().collect())
}

fn validate_regex(lit: &LitStr) -> Result<()> {
    regex::Regex::new(&lit.value())
        .map(drop)
        .map_err(|e| syn::Error::new(lit.span(), format!("invalid regex: {e}")))
}

fn peek_keyword(input: ParseStream, keyword: &str) -> bool {
    input.fork().parse::<Ident>().is_ok_and(|ident| ident == keyword)
}

impl Parse for RuleInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let kind: Ident = input.parse()?;
        let body = match kind.to_string().as_str() {
            "exact" => RuleBody::Exact(input.parse()?),
            "pattern" | "patterns" => {
                let patterns = if kind == "pattern" {
                    vec![input.parse::<LitStr>()?]
                } else {
                    string_list(input, "pattern", &kind)?
                };
                for pattern in &patterns {
                    validate_regex(pattern)?;
                }

                let required = if peek_keyword(input, "requiring") {
                    let keyword: Ident = input.parse()?;
                    string_list(input, "substring", &keyword)?
                } else {
                    Vec::new()
                };

                RuleBody::Patterns { patterns, required }
            }
            "substrings" => RuleBody::Substrings(string_list(input, "substring", &kind)?),
            other => {
                return Err(syn::Error::new(
                    kind.span(),
                    format!(
                        "unknown rule kind `{other}` (expected exact, pattern, patterns, or substrings)"
                    ),
                ));
            }
        };

        let deadline = if peek_keyword(input, "within") {
            input.parse::<Ident>()?;
            Some(input.parse()?)
        } else {
            None
        };

        if !input.is_empty() {
            return Err(input.error("unexpected tokens after rule"));
        }

        Ok(Self { body, deadline })
    }
}

/// Generate the `ExpectationRule` construction.
pub fn expand(input: RuleInput) -> TokenStream {
    let base = match input.body {
        RuleBody::Exact(lit) => quote! {
            ::promptstack::ExpectationRule::exact(#lit)
        },
        RuleBody::Patterns { patterns, required } => quote! {
            ::promptstack::ExpectationRule::from_regexes(::std::vec![
                #(::promptstack::__private::Regex::new(#patterns)
                    .expect("validated at compile time")),*
            ])
            #(.requiring(#required))*
        },
        RuleBody::Substrings(items) => quote! {
            ::promptstack::ExpectationRule::substrings([#(#items),*])
        },
    };

    match input.deadline {
        Some(deadline) => {
            let duration = deadline.to_tokens();
            quote! { { #base.within(#duration) } }
        }
        None => quote! { { #base } },
    }
}
