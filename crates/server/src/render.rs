//! Printable HTML price lists.
//!
//! Every category is laid out as a stack of A4 sheets. The first sheet
//! carries the logo and the title, continuation sheets repeat the title
//! marked as a continuation, and every sheet ends with the business footer.

use configs::RenderConfig;
use models::{PriceCategory, PriceItem};
use service::pagination::{Page, PageLayout};
use url::Url;

const TITLE_ALL: &str = "Прайс-листы услуг";
const TITLE_SUFFIX: &str = "Прайс-лист";
const CONTINUED: &str = "(продолжение)";
const PRINT_BUTTON: &str = "🖨️ Печать / Сохранить как PDF";
const NO_PRICE_LISTS: &str = "Нет доступных прайс-листов";
const EMPTY_CATEGORY: &str = "Нет позиций";
pub const LOAD_ERROR: &str = "Ошибка загрузки цен";
pub const NOT_FOUND: &str = "Прайс-лист не найден";

const STYLE: &str = r#"
body { margin: 0; background: #f9fafb; font-family: Arial, Helvetica, sans-serif; color: #000; }
.container { max-width: 56rem; margin: 0 auto; padding: 2rem 1rem; }
.selector h1 { text-align: center; font-size: 1.875rem; color: #1f2937; }
.selector nav { display: flex; flex-wrap: wrap; justify-content: center; gap: .75rem; margin-bottom: 2rem; }
.selector a { padding: .75rem 1.5rem; border-radius: .5rem; background: #fff; color: #374151; text-decoration: none; box-shadow: 0 1px 3px rgba(0,0,0,.15); }
.selector a.active { background: #2563eb; color: #fff; }
.actions { display: flex; justify-content: center; margin-bottom: 1.5rem; }
.actions button { padding: .75rem 1.5rem; background: #2563eb; color: #fff; border: 0; border-radius: .5rem; cursor: pointer; }
.notice { text-align: center; color: #4b5563; padding: 3rem 0; }
.notice.error { color: #dc2626; font-weight: 600; }
.print-area { width: 210mm; min-height: 297mm; box-sizing: border-box; padding: 20mm; margin: 0 auto 1.5rem; background: #fff; box-shadow: 0 4px 12px rgba(0,0,0,.15); display: flex; flex-direction: column; }
.sheet-body { flex-grow: 1; }
.sheet-header { text-align: center; margin-bottom: 1rem; }
.sheet-header img { width: 120px; display: block; margin: 0 auto; }
.sheet-header h2 { font-size: 1.875rem; margin-top: 1.5rem; }
.row { display: flex; position: relative; justify-content: space-between; align-items: flex-end; padding-bottom: 2px; }
.row .service { flex: 1; padding-right: 1rem; }
.row .service span, .row .price span { background: #fff; position: relative; z-index: 10; font-weight: 500; }
.row .service span { padding-right: .25rem; }
.row .price span { padding-left: .25rem; }
.row .info { font-size: .875rem; color: #6b7280; margin-top: .25rem; }
.row .leader { position: absolute; width: 100%; border-bottom: 1.2px solid #000; bottom: .5rem; z-index: 1; }
.row .price { white-space: nowrap; text-align: right; font-weight: 600; }
.sheet-footer { margin-top: auto; padding-top: 2rem; text-align: center; font-size: .875rem; color: #6b7280; }
.sheet-footer .strong { font-weight: 700; }
.sheet-footer .page-indicator { margin-top: .5rem; color: #9ca3af; }
@page { size: A4; margin: 0; }
@media print {
  body { background: #fff; }
  .container { padding: 0; max-width: none; }
  .no-print { display: none !important; }
  .print-area { box-shadow: none; margin: 0; }
}
"#;

/// Renders full HTML documents for the price list pages.
pub struct PriceListView<'a> {
    pub config: &'a RenderConfig,
    pub layout: PageLayout,
}

impl<'a> PriceListView<'a> {
    pub fn new(config: &'a RenderConfig, layout: PageLayout) -> Self {
        Self { config, layout }
    }

    /// Category selector plus the printable sheets of `selected`.
    ///
    /// `selected` must name a category of `data`; when it is `None` nothing
    /// is selected (only happens for an empty data set).
    pub fn document(&self, data: &PriceCategory, selected: Option<&str>) -> String {
        let title = match selected {
            Some(category) => format!("{category} - {TITLE_SUFFIX} | {}", self.config.brand),
            None => format!("{TITLE_ALL} | {}", self.config.brand),
        };

        let mut body = String::new();
        if data.is_empty() {
            body.push_str(&notice(NO_PRICE_LISTS, false));
            return self.wrap(&title, &body);
        }

        body.push_str("<div class=\"no-print selector\">\n");
        body.push_str(&format!("<h1>{}</h1>\n<nav>\n", escape(TITLE_ALL)));
        for name in data.names() {
            let class = if Some(name) == selected { "category active" } else { "category" };
            body.push_str(&format!(
                "<a class=\"{class}\" href=\"{}\">{}</a>\n",
                escape(&category_href(name)),
                escape(name)
            ));
        }
        body.push_str("</nav>\n</div>\n");

        if let Some((category, items)) = selected.and_then(|s| data.get(s).map(|items| (s, items))) {
            body.push_str(&self.sheets(category, items));
        }
        self.wrap(&title, &body)
    }

    /// Generic failure page; never shows partial data.
    pub fn error_document(&self, message: &str) -> String {
        let title = format!("{TITLE_ALL} | {}", self.config.brand);
        self.wrap(&title, &notice(message, true))
    }

    /// The printable sheets of one category.
    pub fn sheets(&self, category: &str, items: &[PriceItem]) -> String {
        let pages = self.layout.pages(items);
        if pages.is_empty() {
            return notice(EMPTY_CATEGORY, false);
        }

        let mut out = String::new();
        out.push_str(&format!(
            "<div class=\"no-print actions\"><button type=\"button\" onclick=\"window.print()\">{}</button></div>\n",
            escape(PRINT_BUTTON)
        ));
        for page in &pages {
            out.push_str(&self.sheet(category, page));
        }
        out
    }

    fn sheet(&self, category: &str, page: &Page<'_, PriceItem>) -> String {
        let page_break = if page.is_last() { "auto" } else { "always" };
        let mut out = format!(
            "<section class=\"print-area\" data-page=\"{}\" style=\"page-break-after: {page_break}\">\n<div class=\"sheet-body\">\n",
            page.number
        );

        if page.is_first() {
            out.push_str(&format!(
                "<div class=\"sheet-header\"><img src=\"{}\" alt=\"logo\"><h2>{}</h2></div>\n",
                escape(&self.config.logo_url),
                escape(category)
            ));
        } else {
            out.push_str(&format!(
                "<div class=\"sheet-header continued\"><h2>{} {CONTINUED}</h2></div>\n",
                escape(category)
            ));
        }

        out.push_str("<div class=\"rows\">\n");
        for item in page.items {
            out.push_str(&self.row(item));
        }
        out.push_str("</div>\n</div>\n");
        out.push_str(&self.footer(page));
        out.push_str("</section>\n");
        out
    }

    fn row(&self, item: &PriceItem) -> String {
        let info = item
            .additional_info
            .as_deref()
            .map(|info| format!("<div class=\"info\">{}</div>", escape(info)))
            .unwrap_or_default();
        let prefix = item.prefix.as_deref().map(escape).unwrap_or_default();
        format!(
            "<div class=\"row\"><div class=\"service\"><span>{}</span>{info}</div><div class=\"leader\"></div><div class=\"price\"><span>{prefix}{}{}</span></div></div>\n",
            escape(&item.service),
            escape(&item.price.to_string()),
            escape(&self.config.currency_suffix)
        )
    }

    fn footer(&self, page: &Page<'_, PriceItem>) -> String {
        let mut out = String::from("<footer class=\"sheet-footer\">\n");
        if !self.config.footer_note.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", escape(&self.config.footer_note)));
        }
        out.push_str(&format!("<p class=\"strong\">{}</p>\n", escape(&self.config.business_name)));
        if !self.config.phones.is_empty() {
            out.push_str(&format!("<p class=\"strong\">Тел. {}</p>\n", escape(&self.config.phones.join(", "))));
        }
        if page.show_page_indicator() {
            out.push_str(&format!(
                "<p class=\"page-indicator\">Страница {} из {}</p>\n",
                page.number, page.total
            ));
        }
        out.push_str("</footer>\n");
        out
    }

    fn wrap(&self, title: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"ru\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n{body}</div>\n</body>\n</html>\n",
            escape(title)
        )
    }
}

fn notice(message: &str, error: bool) -> String {
    let class = if error { "notice error" } else { "notice" };
    format!("<div class=\"{class}\"><p>{}</p></div>\n", escape(message))
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Page path for a category, with the name percent-encoded as one segment.
fn category_href(name: &str) -> String {
    let Ok(mut url) = Url::parse("http://localhost/prices/") else {
        return String::from("/");
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(name);
    }
    url.path().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn items(n: usize) -> Vec<PriceItem> {
        (0..n)
            .map(|i| PriceItem::from_row(&[json!(format!("Услуга {i}")), json!(format!("{}", 100 + i))]))
            .collect()
    }

    fn data() -> PriceCategory {
        let mut cats = PriceCategory::new();
        cats.insert("Маникюр", items(30));
        cats.insert("Подология", vec![]);
        cats.insert("Услуги бровиста", items(2));
        cats
    }

    #[test]
    fn multi_page_category_has_continuation_and_indicator() {
        let cfg = RenderConfig::default();
        let view = PriceListView::new(&cfg, PageLayout::default());
        let html = view.document(&data(), Some("Маникюр"));

        assert_eq!(html.matches("class=\"print-area\"").count(), 2);
        assert_eq!(html.matches("alt=\"logo\"").count(), 1);
        assert!(html.contains("Маникюр (продолжение)"));
        assert!(html.contains("Страница 1 из 2"));
        assert!(html.contains("Страница 2 из 2"));
        assert!(html.contains("page-break-after: always"));
        assert!(html.contains("<title>Маникюр - Прайс-лист | Манхэттен beauty bar</title>"));
        assert!(html.contains("class=\"category active\" href=\"/prices/%D0%9C"));
    }

    #[test]
    fn single_page_category_has_no_indicator() {
        let cfg = RenderConfig::default();
        let view = PriceListView::new(&cfg, PageLayout::default());
        let html = view.document(&data(), Some("Услуги бровиста"));

        assert_eq!(html.matches("class=\"print-area\"").count(), 1);
        assert!(!html.contains("Страница"));
        assert!(!html.contains("(продолжение)"));
        assert!(html.contains(&cfg.business_name));
    }

    #[test]
    fn row_shows_prefix_price_suffix_and_info() {
        let cfg = RenderConfig::default();
        let view = PriceListView::new(&cfg, PageLayout::default());
        let item = PriceItem::from_row(&[json!("Педикюр"), json!("2500"), json!("от "), json!("с покрытием")]);
        let html = view.sheets("Педикюр", &[item]);
        assert!(html.contains("<span>от 2500 р.</span>"));
        assert!(html.contains("<div class=\"info\">с покрытием</div>"));
    }

    #[test]
    fn empty_category_and_empty_data_have_notices() {
        let cfg = RenderConfig::default();
        let view = PriceListView::new(&cfg, PageLayout::default());

        let html = view.document(&data(), Some("Подология"));
        assert!(html.contains(EMPTY_CATEGORY));
        assert!(!html.contains("print-area\""));

        let html = view.document(&PriceCategory::new(), None);
        assert!(html.contains(NO_PRICE_LISTS));
        assert!(html.contains("<title>Прайс-листы услуг | Манхэттен beauty bar</title>"));
    }

    #[test]
    fn user_text_is_escaped() {
        let cfg = RenderConfig::default();
        let view = PriceListView::new(&cfg, PageLayout::default());
        let item = PriceItem::from_row(&[json!("<script>alert(1)</script>"), json!("1 & 2")]);
        let html = view.sheets("A", &[item]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("1 &amp; 2"));
    }

    #[test]
    fn error_document_has_no_sheets() {
        let cfg = RenderConfig::default();
        let view = PriceListView::new(&cfg, PageLayout::default());
        let html = view.error_document(LOAD_ERROR);
        assert!(html.contains("notice error"));
        assert!(html.contains(LOAD_ERROR));
        assert!(!html.contains("print-area\""));
    }

    #[test]
    fn category_href_encodes_one_segment() {
        assert_eq!(category_href("abc-1"), "/prices/abc-1");
        assert_eq!(category_href("a b/c?"), "/prices/a%20b%2Fc%3F");
        assert_eq!(category_href("Маникюр"), "/prices/%D0%9C%D0%B0%D0%BD%D0%B8%D0%BA%D1%8E%D1%80");
    }
}
