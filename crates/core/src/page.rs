//! Read-only view of the page/token provider
//!
//! The backend supplies, per page, an ordered token array with pixel bounds
//! and text. This module never mutates that data; it resolves pixel-space
//! selections against it to build token-snapped annotations.

use crate::annotation::{Annotation, TokenId};
use crate::geometry::Bounds;
use crate::ontology::OntoClass;
use serde::{Deserialize, Serialize};

/// The smallest addressable unit of PDF text layout, roughly a word
///
/// Carries its own pixel bounds in unscaled page space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub text: String,
}

impl Token {
    /// Bounds of this token in unscaled page space
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Page dimensions as reported by the token provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 0-based page index
    pub index: usize,
    pub width: f32,
    pub height: f32,
}

/// Wire shape of one page's token data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTokens {
    pub page: Page,
    pub tokens: Vec<Token>,
}

/// One page's tokens plus its current render scale
///
/// Selections coming from the canvas are in rendered pixels, so token
/// bounds are scaled to the same space before intersection tests.
#[derive(Debug, Clone)]
pub struct PageInfo {
    pub page: Page,
    pub tokens: Vec<Token>,
    pub scale: f32,
}

impl PageInfo {
    /// Create a page view at the initial 1:1 render scale
    pub fn new(page: Page, tokens: Vec<Token>) -> Self {
        Self {
            page,
            tokens,
            scale: 1.0,
        }
    }

    pub fn from_page_tokens(page_tokens: PageTokens) -> Self {
        Self::new(page_tokens.page, page_tokens.tokens)
    }

    /// Scale stored bounds into the page's current render space
    pub fn scaled_bounds(&self, bounds: &Bounds) -> Bounds {
        bounds.scaled(self.scale)
    }

    /// Bounds of a token in the page's current render space
    pub fn scaled_token_bounds(&self, token: &Token) -> Bounds {
        token.bounds().scaled(self.scale)
    }

    /// Token ids whose bounds overlap the selection, in page token order
    ///
    /// Inclusion is by any overlap, not containment.
    pub fn tokens_for_selection(&self, selection: &Bounds) -> Vec<TokenId> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| selection.intersects(&self.scaled_token_bounds(token)))
            .map(|(token_index, _)| TokenId {
                page_index: self.page.index,
                token_index,
            })
            .collect()
    }

    /// Build an annotation from a normalized pixel selection
    ///
    /// Returns `None` for zero-area selections. In free-form mode, or when
    /// no token overlaps the selection, the annotation keeps the raw
    /// selection rectangle and carries no tokens. Otherwise it snaps to the
    /// matched tokens: bounds become the hull of their rendered bounds and
    /// the cached text joins their texts in token order.
    pub fn annotation_for_bounds(
        &self,
        selection: Bounds,
        active_class: &OntoClass,
        free_form: bool,
    ) -> Option<Annotation> {
        let selection = selection.normalized();
        if selection.is_empty() {
            return None;
        }

        if free_form {
            return Some(Annotation::new(
                selection,
                self.page.index,
                active_class.clone(),
                None,
                None,
            ));
        }

        let token_ids = self.tokens_for_selection(&selection);
        if token_ids.is_empty() {
            // Nothing to snap to; fall back to the raw rectangle.
            return Some(Annotation::new(
                selection,
                self.page.index,
                active_class.clone(),
                None,
                None,
            ));
        }

        let mut bounds: Option<Bounds> = None;
        let mut words: Vec<&str> = Vec::with_capacity(token_ids.len());
        for id in &token_ids {
            let token = &self.tokens[id.token_index];
            let token_bounds = self.scaled_token_bounds(token);
            bounds = Some(match bounds {
                Some(hull) => hull.union(&token_bounds),
                None => token_bounds,
            });
            words.push(token.text.as_str());
        }

        Some(Annotation::new(
            bounds.unwrap_or(selection),
            self.page.index,
            active_class.clone(),
            Some(token_ids),
            Some(words.join(" ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::test_support::test_class;

    fn token(x: f32, y: f32, width: f32, height: f32, text: &str) -> Token {
        Token {
            x,
            y,
            width,
            height,
            text: text.to_string(),
        }
    }

    fn test_page() -> PageInfo {
        PageInfo::new(
            Page {
                index: 0,
                width: 612.0,
                height: 792.0,
            },
            vec![
                token(0.0, 0.0, 10.0, 10.0, "alpha"),
                token(12.0, 0.0, 10.0, 10.0, "beta"),
                token(0.0, 14.0, 10.0, 10.0, "gamma"),
            ],
        )
    }

    #[test]
    fn test_corner_overlap_includes_token() {
        let page = test_page();
        let a = page
            .annotation_for_bounds(Bounds::new(5.0, 5.0, 15.0, 15.0), &test_class("C"), false)
            .unwrap();
        let tokens = a.tokens.unwrap();
        assert!(tokens.iter().any(|t| t.token_index == 0));
    }

    #[test]
    fn test_zero_area_selection_yields_nothing() {
        let page = test_page();
        assert!(page
            .annotation_for_bounds(Bounds::anchored_at(5.0, 5.0), &test_class("C"), false)
            .is_none());
        assert!(page
            .annotation_for_bounds(Bounds::anchored_at(5.0, 5.0), &test_class("C"), true)
            .is_none());
    }

    #[test]
    fn test_disjoint_selection_falls_back_to_free_form() {
        let page = test_page();
        let selection = Bounds::new(100.0, 100.0, 130.0, 130.0);
        let a = page
            .annotation_for_bounds(selection, &test_class("C"), false)
            .unwrap();
        assert!(a.tokens.is_none());
        assert!(a.text.is_none());
        assert_eq!(a.bounds, selection);
    }

    #[test]
    fn test_free_form_mode_never_snaps() {
        let page = test_page();
        let selection = Bounds::new(0.0, 0.0, 25.0, 12.0);
        let a = page
            .annotation_for_bounds(selection, &test_class("C"), true)
            .unwrap();
        assert!(a.tokens.is_none());
        assert_eq!(a.bounds, selection);
    }

    #[test]
    fn test_snapped_annotation_collects_tokens_in_order() {
        let page = test_page();
        let a = page
            .annotation_for_bounds(Bounds::new(-1.0, -1.0, 30.0, 25.0), &test_class("C"), false)
            .unwrap();

        let tokens = a.tokens.unwrap();
        let indices: Vec<usize> = tokens.iter().map(|t| t.token_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(a.text.as_deref(), Some("alpha beta gamma"));
        // Hull of the three token boxes.
        assert_eq!(a.bounds, Bounds::new(0.0, 0.0, 22.0, 24.0));
    }

    #[test]
    fn test_inverted_selection_is_normalized_before_matching() {
        let page = test_page();
        let a = page
            .annotation_for_bounds(Bounds::new(15.0, 15.0, 5.0, 5.0), &test_class("C"), false)
            .unwrap();
        assert!(a.tokens.is_some());
    }

    #[test]
    fn test_selection_matches_against_scaled_token_bounds() {
        let mut page = test_page();
        page.scale = 2.0;

        // At 2x render scale the first token covers (0,0)-(20,20); a
        // selection around (15,15) only hits it in scaled space.
        let a = page
            .annotation_for_bounds(Bounds::new(14.0, 14.0, 19.0, 19.0), &test_class("C"), false)
            .unwrap();
        let tokens = a.tokens.unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_index, 0);
    }

    #[test]
    fn test_token_id_carries_page_index() {
        let mut page = test_page();
        page.page.index = 4;
        let ids = page.tokens_for_selection(&Bounds::new(0.0, 0.0, 50.0, 50.0));
        assert!(ids.iter().all(|t| t.page_index == 4));
    }
}
