//! Bell-schedule page extraction.
//!
//! Everything that depends on the Genesis page layout lives here, behind
//! [`ScheduleExtractor`], so a layout change only touches this module.

use scraper::{ElementRef, Html, Selector};

use crate::{ParsedSchedule, RawCourseRow, SCHOOL_CLOSED, ScheduleState};

/// Color used for course blocks rendered without a styled container
pub const FALLBACK_COLOR: &str = "#3a3a3a";

const ROOM_PREFIX: &str = "Room: ";

/// Turns one day's raw markup into a [`ParsedSchedule`].
///
/// Extraction never fails: markup that matches no known shape is reported as
/// [`ScheduleState::NoSchedule`].
pub trait ScheduleExtractor: Send + Sync {
    /// Classify the page and pull out its course rows
    fn extract(&self, markup: &str) -> ParsedSchedule;
}

/// Extractor for the Genesis `ajaxGetBellScheduleForDateJsp` page
pub struct GenesisExtractor {
    closed_cell: Selector,
    header_wide: Selector,
    header_narrow: Selector,
    list_row: Selector,
    cell: Selector,
    time_part: Selector,
}

impl GenesisExtractor {
    /// Compile the page selectors
    pub fn new() -> Self {
        Self {
            closed_cell: selector("td.cellCenter"),
            header_wide: selector(r#"td[colspan="3"]"#),
            header_narrow: selector(r#"td[colspan="2"]"#),
            list_row: selector("tr.listrow"),
            cell: selector("td"),
            time_part: selector("div"),
        }
    }

    fn is_closed(&self, document: &Html) -> bool {
        document
            .select(&self.closed_cell)
            .any(|cell| collect_text(cell).trim() == SCHOOL_CLOSED)
    }

    /// Split the header cell into schedule name and embedded date.
    fn header(&self, document: &Html) -> Option<(String, String)> {
        let cell = document
            .select(&self.header_wide)
            .next()
            .or_else(|| document.select(&self.header_narrow).next())?;

        let text = collect_text(cell);
        let (name, date) = text.trim().rsplit_once(' ')?;
        let date = date.trim_matches(|c| c == '(' || c == ')');

        Some((name.to_string(), date.to_string()))
    }

    fn parse_row(&self, row: ElementRef<'_>) -> Option<RawCourseRow> {
        let cells: Vec<ElementRef<'_>> = row.select(&self.cell).collect();
        let [time_cell, course_cell] = cells.as_slice() else {
            return None;
        };

        let times: Vec<String> = time_cell
            .select(&self.time_part)
            .map(|div| collect_text(div).trim().to_string())
            .collect();
        let [block, start_time, end_time, ..] = times.as_slice() else {
            return None;
        };

        let (details, color) = course_details(*course_cell)?;
        let mut details = details.into_iter();
        let course_name = details.next().unwrap_or_default();
        if course_name.is_empty() {
            return None;
        }
        let teacher = details.next().unwrap_or_default();
        let room = details
            .next()
            .map(|room| room.strip_prefix(ROOM_PREFIX).unwrap_or(&room).to_string())
            .unwrap_or_default();

        Some(RawCourseRow {
            block: block.clone(),
            start_time: start_time.clone(),
            end_time: end_time.clone(),
            course_name,
            teacher,
            room,
            color,
        })
    }
}

impl Default for GenesisExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleExtractor for GenesisExtractor {
    fn extract(&self, markup: &str) -> ParsedSchedule {
        let document = Html::parse_document(markup);

        if self.is_closed(&document) {
            return ParsedSchedule::closed();
        }

        let Some((name, date)) = self.header(&document) else {
            return ParsedSchedule::no_schedule();
        };

        let state = ScheduleState::from_label(&name);
        if !state.is_open() {
            return ParsedSchedule {
                state,
                date: String::new(),
                rows: Vec::new(),
            };
        }

        let rows = document
            .select(&self.list_row)
            .filter_map(|row| self.parse_row(row))
            .collect();

        ParsedSchedule { state, date, rows }
    }
}

/// Course fields and color from the second cell of a schedule row.
///
/// A regular block nests the course inside a styled container
/// (`<td><div><div style="background-color: ..."><b>NAME</b><br>...`);
/// anything else is read as newline-separated plain text.
fn course_details(cell: ElementRef<'_>) -> Option<(Vec<String>, String)> {
    let first = cell.children().next()?;

    match ElementRef::wrap(first) {
        Some(wrapper) => {
            let content = ElementRef::wrap(wrapper.children().next()?)?;
            let details = content
                .children()
                .filter_map(|node| match ElementRef::wrap(node) {
                    Some(el) if el.value().name() == "br" => None,
                    Some(el) => Some(collect_text(el).trim().to_string()),
                    None => node.value().as_text().map(|t| t.trim().to_string()),
                })
                .collect();
            let color = content
                .value()
                .attr("style")
                .map(background_color)
                .unwrap_or_default();

            Some((details, color))
        }
        None => {
            let text = collect_text(cell);
            let details = text
                .split('\n')
                .skip(1)
                .take(3)
                .map(|line| line.trim().to_string())
                .collect();

            Some((details, FALLBACK_COLOR.to_string()))
        }
    }
}

/// `background-color` value of an inline style, empty if absent.
fn background_color(style: &str) -> String {
    style
        .split_once("background-color:")
        .and_then(|(_, rest)| rest.split(';').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn collect_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}
