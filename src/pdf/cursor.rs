use crate::config::PageGeometry;

use super::layout::LayoutBox;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    WritingRows,
    PageBreakNeeded,
    WritingTotals,
    Done,
}

/// Outline of the item table on one page, from its origin down to where the
/// last row on that page ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TableBorder {
    pub(crate) page: usize,
    pub(crate) rect: LayoutBox,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PageBreak {
    pub(crate) closed_border: Option<TableBorder>,
    pub(crate) new_page: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct TotalsStart {
    pub(crate) closed_border: Option<TableBorder>,
    pub(crate) new_page: Option<usize>,
}

/// Vertical write position and page tracking for one render pass.
///
/// The cursor only does geometry; the caller draws. Every transition that
/// needs drawing (a closed table border, a fresh page) is returned to the
/// caller instead of being performed here.
pub(crate) struct RenderCursor {
    y: f32,
    page_index: usize,
    table_origin_y: Option<f32>,
    phase: Phase,
    continuation_top: f32,
    footer_reserve: f32,
    table_x: f32,
    table_width: f32,
}

impl RenderCursor {
    pub(crate) fn new(geometry: &PageGeometry, start_y: f32) -> Self {
        Self {
            y: start_y,
            page_index: 0,
            table_origin_y: None,
            phase: Phase::WritingRows,
            continuation_top: geometry.content_top(),
            footer_reserve: geometry.footer_reserve,
            table_x: geometry.side_margin,
            table_width: geometry.content_width(),
        }
    }

    pub(crate) fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn page_index(&self) -> usize {
        self.page_index
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn fits(&self, height: f32) -> bool {
        self.y - height >= self.footer_reserve
    }

    pub(crate) fn advance(&mut self, height: f32) {
        self.y -= height;
    }

    /// Mark the current Y as the top of this page's item table.
    pub(crate) fn open_table(&mut self) {
        self.table_origin_y = Some(self.y);
    }

    pub(crate) fn close_table_border(&mut self) -> Option<TableBorder> {
        let origin = self.table_origin_y.take()?;
        let height = origin - self.y;
        (height > 0.0).then(|| TableBorder {
            page: self.page_index,
            rect: LayoutBox::new(self.table_x, origin, self.table_width, height),
        })
    }

    fn new_page(&mut self) -> usize {
        self.page_index += 1;
        self.y = self.continuation_top;
        self.table_origin_y = None;
        self.page_index
    }

    /// Called once before each row. A row that does not fit above the footer
    /// reserve moves whole to a new page and is drawn there even if it is
    /// taller than the page.
    pub(crate) fn break_page_if_needed(&mut self, row_height: f32) -> Option<PageBreak> {
        debug_assert_eq!(self.phase, Phase::WritingRows);
        if self.fits(row_height) {
            return None;
        }
        self.phase = Phase::PageBreakNeeded;
        let closed_border = self.close_table_border();
        let new_page = self.new_page();
        self.phase = Phase::WritingRows;
        Some(PageBreak {
            closed_border,
            new_page,
        })
    }

    /// Leave row mode. The totals box and disclaimer need `needed` points;
    /// when the page cannot hold them they start a new page.
    pub(crate) fn begin_totals(&mut self, needed: f32) -> TotalsStart {
        let closed_border = self.close_table_border();
        self.phase = Phase::WritingTotals;
        let new_page = if self.fits(needed) {
            None
        } else {
            Some(self.new_page())
        };
        TotalsStart {
            closed_border,
            new_page,
        }
    }

    /// Carry the totals section (in practice a long disclaimer) onto a new page.
    pub(crate) fn continue_totals_on_new_page(&mut self) -> usize {
        debug_assert_eq!(self.phase, Phase::WritingTotals);
        self.new_page()
    }

    pub(crate) fn finish(&mut self) {
        debug_assert_eq!(self.phase, Phase::WritingTotals);
        self.phase = Phase::Done;
    }
}
