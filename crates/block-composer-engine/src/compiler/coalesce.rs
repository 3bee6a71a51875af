use super::CompilerOptions;
use crate::manifest::Definition;

/// Folds loose siblings into the section pattern before them.
///
/// Every definition's existing inner blocks are coalesced first, at any
/// depth. Then, scanning left to right, a section pattern absorbs every
/// following definition up to the next pattern reference, and the grown
/// list is coalesced again so a section nested inside a section groups its
/// own siblings. The total number of definitions never changes.
pub fn coalesce(definitions: Vec<Definition>, options: &CompilerOptions) -> Vec<Definition> {
    let mut out = Vec::with_capacity(definitions.len());
    let mut rest = definitions.into_iter().peekable();

    while let Some(mut definition) = rest.next() {
        if let Some(inner) = definition.inner_blocks_mut()
            && !inner.is_empty()
        {
            *inner = coalesce(std::mem::take(inner), options);
        }

        if let Definition::Pattern(pattern) = &mut definition
            && options.is_section_pattern(&pattern.slug)
        {
            let before = pattern.inner_blocks.len();
            while let Some(sibling) = rest.next_if(|d| !d.is_pattern_reference()) {
                pattern.inner_blocks.push(sibling);
            }
            let moved = pattern.inner_blocks.len() - before;
            if moved > 0 {
                log::debug!("Moved {moved} sibling(s) into section {}", pattern.slug);
                let absorbed = std::mem::take(&mut pattern.inner_blocks);
                pattern.inner_blocks = coalesce(absorbed, options);
            }
        }
        out.push(definition);
    }

    out
}
