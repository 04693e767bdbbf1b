//! Grouping of product variants into families that differ only by pack size.

/// Base product name of a variant: the name with one trailing parenthetical
/// group and the whitespace before it removed.
///
/// The parenthetical content is not inspected, so `"Serum (30ml)"`,
/// `"Serum (2x30ml)"` and `"Serum (refill)"` all belong to `"Serum"`. A name
/// that is nothing but a parenthetical keeps its full text.
#[must_use]
pub fn family_name(variant: &str) -> &str {
    let trimmed = variant.trim();
    if !trimmed.ends_with(')') {
        return trimmed;
    }

    let mut depth = 0usize;
    for (idx, ch) in trimmed.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let base = trimmed[..idx].trim_end();
                    return if base.is_empty() { trimmed } else { base };
                }
            }
            _ => {}
        }
    }

    // Unbalanced parentheses: no group to strip.
    trimmed
}

/// One product family and its member variants, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFamily<'a> {
    pub name: &'a str,
    pub variants: Vec<&'a str>,
}

/// Groups variant names by [`family_name`].
///
/// Families appear in the order their first variant appears in the input, and
/// each family lists its variants in input order. Duplicate names are kept.
#[must_use]
pub fn group_by_family<'a, I>(variants: I) -> Vec<ProductFamily<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut families: Vec<ProductFamily<'a>> = Vec::new();

    for variant in variants {
        let name = family_name(variant);
        match families.iter_mut().find(|family| family.name == name) {
            Some(family) => family.variants.push(variant),
            None => families.push(ProductFamily {
                name,
                variants: vec![variant],
            }),
        }
    }

    families
}
