//! `within` clause: human-readable deadlines such as `2 s + 500 ms`.

use std::time::Duration;

use proc_macro2::TokenStream;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::{Ident, LitInt, Result, Token};

/// A parsed deadline, summed at compile time.
pub struct Deadline(pub Duration);

fn unit_duration(unit: &Ident) -> Result<Duration> {
    let duration = match unit.to_string().as_str() {
        "us" | "micros" => Duration::from_micros(1),
        "ms" | "millis" => Duration::from_millis(1),
        "s" | "sec" | "secs" => Duration::from_secs(1),
        "m" | "min" | "mins" => Duration::from_secs(60),
        other => {
            return Err(syn::Error::new(
                unit.span(),
                format!("unknown deadline unit `{other}` (expected us, ms, s, or m)"),
            ));
        }
    };
    Ok(duration)
}

fn parse_term(input: ParseStream) -> Result<Duration> {
    let amount: LitInt = input.parse()?;
    let count: u32 = amount.base10_parse()?;
    let unit: Ident = input.parse()?;
    unit_duration(&unit)?
        .checked_mul(count)
        .ok_or_else(|| syn::Error::new(amount.span(), "deadline overflows"))
}

impl Parse for Deadline {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut total = parse_term(input)?;
        while input.peek(Token![+]) {
            input.parse::<Token![+]>()?;
            let term = parse_term(input)?;
            total = total
                .checked_add(term)
                .ok_or_else(|| input.error("deadline overflows"))?;
        }
        Ok(Self(total))
    }
}

impl Deadline {
    /// Tokens constructing the equivalent `std::time::Duration`.
    pub fn to_tokens(&self) -> TokenStream {
        let secs = self.0.as_secs();
        let nanos = self.0.subsec_nanos();
        quote! { ::std::time::Duration::new(#secs, #nanos) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn single_term() {
        let deadline: Deadline = parse_quote!(5 s);
        assert_eq!(deadline.0, Duration::from_secs(5));
    }

    #[test]
    fn summed_terms() {
        let deadline: Deadline = parse_quote!(1 m + 2 s + 250 ms);
        assert_eq!(deadline.0, Duration::from_millis(62_250));
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let result: Result<Deadline> = syn::parse2(quote!(3 fortnights));
        assert!(result.is_err());
    }
}
