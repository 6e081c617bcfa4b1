//! Extraction: typed `analyzeResult` → [`AnalysisResult`].
//!
//! Missing content is an empty string and a missing or empty page list
//! counts as a single page; both are documented fallbacks of the service, not errors.

use crate::config::AnalysisProfile;
use crate::output::{AnalysisResult, CheckedRegion, Point};
use crate::remote::{AnalyzeResult, MarkState};
use tracing::{debug, warn};

/// Build the normalised result for `profile` from a succeeded job.
pub fn extract(result: Option<&AnalyzeResult>, profile: AnalysisProfile) -> AnalysisResult {
    let text = result
        .and_then(|r| r.content.clone())
        .unwrap_or_default();

    let page_count = result
        .and_then(|r| r.pages.as_ref())
        .map(Vec::len)
        .filter(|n| *n > 0)
        .unwrap_or(1);

    let checked_regions = match (profile, result) {
        (AnalysisProfile::Layout, Some(r)) => checked_regions(r),
        _ => Vec::new(),
    };

    debug!(
        "Extracted {} chars, {} pages, {} checked regions",
        text.len(),
        page_count,
        checked_regions.len()
    );

    AnalysisResult {
        text,
        page_count,
        checked_regions,
    }
}

/// Every `selected` mark on every page, in page order then service order.
fn checked_regions(result: &AnalyzeResult) -> Vec<CheckedRegion> {
    let Some(pages) = result.pages.as_ref() else {
        return Vec::new();
    };

    let mut regions = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        let page_num = page.page_number.unwrap_or(idx as u32 + 1);
        for mark in &page.selection_marks {
            if mark.state != MarkState::Selected {
                continue;
            }
            if mark.polygon.len() % 2 != 0 {
                warn!(
                    "Page {}: selection mark polygon has odd length {}; dropping last coordinate",
                    page_num,
                    mark.polygon.len()
                );
            }
            let polygon = mark
                .polygon
                .chunks_exact(2)
                .map(|xy| Point { x: xy[0], y: xy[1] })
                .collect();
            regions.push(CheckedRegion {
                page: page_num,
                polygon,
            });
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{AnalyzedPage, SelectionMark};

    fn mark(state: MarkState, polygon: Vec<f64>) -> SelectionMark {
        SelectionMark {
            state,
            polygon,
            confidence: Some(0.99),
        }
    }

    fn page(number: Option<u32>, marks: Vec<SelectionMark>) -> AnalyzedPage {
        AnalyzedPage {
            page_number: number,
            selection_marks: marks,
            ..Default::default()
        }
    }

    #[test]
    fn text_without_pages_defaults_to_one_page() {
        let r = AnalyzeResult {
            content: Some("ABC".into()),
            ..Default::default()
        };
        let out = extract(Some(&r), AnalysisProfile::Read);
        assert_eq!(out.text, "ABC");
        assert_eq!(out.page_count, 1);
        assert!(out.checked_regions.is_empty());
    }

    #[test]
    fn missing_result_is_empty_single_page() {
        let out = extract(None, AnalysisProfile::Layout);
        assert_eq!(out.text, "");
        assert_eq!(out.page_count, 1);
        assert!(out.checked_regions.is_empty());
    }

    #[test]
    fn empty_page_list_counts_as_one_page() {
        let r = AnalyzeResult {
            content: Some("ABC".into()),
            pages: Some(vec![]),
            ..Default::default()
        };
        let out = extract(Some(&r), AnalysisProfile::Read);
        assert_eq!(out.text, "ABC");
        assert_eq!(out.page_count, 1);
    }

    #[test]
    fn page_count_follows_page_list() {
        let r = AnalyzeResult {
            pages: Some(vec![page(Some(1), vec![]), page(Some(2), vec![]), page(Some(3), vec![])]),
            ..Default::default()
        };
        assert_eq!(extract(Some(&r), AnalysisProfile::Read).page_count, 3);
    }

    #[test]
    fn layout_keeps_only_selected_marks() {
        let r = AnalyzeResult {
            content: Some("form".into()),
            pages: Some(vec![page(
                Some(1),
                vec![
                    mark(MarkState::Selected, vec![0.1, 0.2, 0.3, 0.2, 0.3, 0.4, 0.1, 0.4]),
                    mark(MarkState::Unselected, vec![1.0, 1.0, 2.0, 2.0]),
                ],
            )]),
            ..Default::default()
        };
        let out = extract(Some(&r), AnalysisProfile::Layout);
        assert_eq!(out.checked_regions.len(), 1);
        let region = &out.checked_regions[0];
        assert_eq!(region.page, 1);
        assert_eq!(region.polygon.len(), 4);
        assert_eq!(region.polygon[0], Point { x: 0.1, y: 0.2 });
        assert_eq!(region.polygon[3], Point { x: 0.1, y: 0.4 });
    }

    #[test]
    fn read_profile_never_yields_regions() {
        let r = AnalyzeResult {
            pages: Some(vec![page(Some(1), vec![mark(MarkState::Selected, vec![0.0, 0.0])])]),
            ..Default::default()
        };
        assert!(extract(Some(&r), AnalysisProfile::Read).checked_regions.is_empty());
    }

    #[test]
    fn regions_carry_page_numbers_in_order() {
        let r = AnalyzeResult {
            pages: Some(vec![
                page(None, vec![mark(MarkState::Selected, vec![1.0, 1.0])]),
                page(None, vec![]),
                page(None, vec![
                    mark(MarkState::Selected, vec![2.0, 2.0]),
                    mark(MarkState::Unknown, vec![3.0, 3.0]),
                    mark(MarkState::Selected, vec![4.0, 4.0, 5.0]),
                ]),
            ]),
            ..Default::default()
        };
        let out = extract(Some(&r), AnalysisProfile::Layout);
        let pages: Vec<u32> = out.checked_regions.iter().map(|c| c.page).collect();
        assert_eq!(pages, vec![1, 3, 3]);
        // Odd-length polygon keeps only complete pairs.
        assert_eq!(out.checked_regions[2].polygon, vec![Point { x: 4.0, y: 4.0 }]);
    }
}
