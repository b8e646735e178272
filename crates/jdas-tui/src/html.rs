// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Static HTML snapshot of the dashboard. Every industry gets a pane; only
//! the active one is visible.

use jdas_app::{
    Card, DashboardState, EMPTY_PLACEHOLDER, ERROR_PLACEHOLDER, Industry, LOADING_PLACEHOLDER,
    PaneContent, PaneView, project_all,
};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#f8fafc;color:#0f172a}
header{display:flex;justify-content:space-between;align-items:center;padding:12px 20px;background:#fff;border-bottom:1px solid #e2e8f0}
.status{font-size:13px;padding:2px 8px;border-radius:10px;background:#e2e8f0}
.status-ok{background:#dcfce7}.status-error{background:#fee2e2}.status-pending{background:#fef9c3}
.tabs,.subtabs{display:flex;gap:6px;padding:8px 20px}
.tab,.subtab{border:1px solid #cbd5e1;background:#fff;border-radius:6px;padding:4px 10px}
.tab.active,.subtab.active{border-color:var(--accent);color:var(--accent);font-weight:600}
.cards{display:grid;grid-template-columns:repeat(auto-fill,minmax(280px,1fr));gap:12px;padding:8px 20px}
.card{background:#fff;border:1px solid #e2e8f0;border-top:3px solid var(--accent);border-radius:8px;padding:12px}
.card h3{margin:0 0 6px;font-size:15px}.meta{font-size:12px;color:#64748b}
.placeholder{padding:8px 20px;color:#64748b}
";

/// HTML-escapes `& < > \" '`.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_page(state: &DashboardState) -> String {
    let mut html = String::from("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>Industry Updates</title>\n");
    html.push_str(&format!("<style>\n{STYLE}</style>\n</head>\n<body>\n"));

    let level = state.status.level.as_str();
    html.push_str(&format!(
        "<header><h1>Industry Updates</h1><span id=\"status\" class=\"status status-{level}\">{}</span></header>\n",
        escape_html(&state.status.message)
    ));

    html.push_str("<nav class=\"tabs\">\n");
    for industry in Industry::ALL {
        let active = if industry == state.active_industry {
            " active"
        } else {
            ""
        };
        html.push_str(&format!(
            "<button class=\"tab{active}\" data-industry=\"{}\" style=\"--accent:{}\">{}</button>\n",
            industry.key(),
            industry.accent(),
            escape_html(industry.label())
        ));
    }
    html.push_str("</nav>\n");

    for pane in project_all(state) {
        render_pane(&mut html, &pane);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_pane(html: &mut String, pane: &PaneView) {
    let industry = pane.industry;
    let hidden = if pane.visible { "" } else { " hidden" };
    html.push_str(&format!(
        "<section class=\"pane\" id=\"pane-{key}\" data-industry=\"{key}\" style=\"--accent:{accent}\"{hidden}>\n",
        key = industry.key(),
        accent = industry.accent(),
    ));

    html.push_str("<nav class=\"subtabs\">");
    for subtab in &pane.subtabs {
        let active = pane
            .active_subtab
            .as_ref()
            .is_some_and(|key| key.matches(subtab.key.as_str()));
        html.push_str(&format!(
            "<button class=\"subtab{}\" data-subtab=\"{}\">{}</button>",
            if active { " active" } else { "" },
            escape_html(subtab.key.as_str()),
            escape_html(&subtab.label)
        ));
    }
    html.push_str("</nav>\n");

    match &pane.content {
        PaneContent::Loading => push_placeholder(html, LOADING_PLACEHOLDER),
        PaneContent::Error => push_placeholder(html, ERROR_PLACEHOLDER),
        PaneContent::Empty => push_placeholder(html, EMPTY_PLACEHOLDER),
        PaneContent::Cards(cards) => {
            html.push_str("<div class=\"cards\">\n");
            for card in cards {
                render_card(html, card);
            }
            html.push_str("</div>\n");
        }
    }
    html.push_str("</section>\n");
}

fn push_placeholder(html: &mut String, text: &str) {
    html.push_str(&format!("<p class=\"placeholder\">{}</p>\n", escape_html(text)));
}

fn render_card(html: &mut String, card: &Card) {
    html.push_str("<article class=\"card\">");
    html.push_str(&format!("<h3>{}</h3>", escape_html(&card.title)));

    let meta: Vec<String> = [&card.tag, &card.date]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(|part| escape_html(part))
        .collect();
    if !meta.is_empty() {
        html.push_str(&format!("<div class=\"meta\">{}</div>", meta.join(" · ")));
    }
    for (class, text) in [
        ("subtitle", &card.subtitle),
        ("body", &card.body),
        ("details", &card.details),
    ] {
        if !text.is_empty() {
            html.push_str(&format!("<p class=\"{class}\">{}</p>", escape_html(text)));
        }
    }
    html.push_str("</article>\n");
}

#[cfg(test)]
mod tests {
    use super::{escape_html, render_page};
    use jdas_app::{
        DashboardCommand, DashboardState, Industry, SubtabGrouping, SummaryPayload,
    };
    use jdas_testkit::{block_json, card, demo_summary, fixture_datetime, summary_json};

    fn loaded(payload: SummaryPayload) -> DashboardState {
        let mut state = DashboardState::default();
        state.dispatch(DashboardCommand::Reload);
        let token = state.load_token();
        state.dispatch(DashboardCommand::LoadSucceeded { token, payload });
        state
    }

    fn section<'a>(page: &'a str, industry: Industry) -> &'a str {
        let start_marker = format!("id=\"pane-{}\"", industry.key());
        let start = page.find(&start_marker).expect("pane present");
        let rest = &page[start..];
        let end = rest.find("</section>").expect("pane closed");
        &rest[..end]
    }

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn single_record_renders_under_its_table_subtab() {
        let blocks = summary_json(&[(
            "real_estate",
            block_json(
                Industry::RealEstate,
                &[card("jdas_housingmarketinsight", "X")],
            ),
        )]);
        let payload = SummaryPayload::from_blocks(
            blocks["blocks"].as_object().expect("blocks object"),
        );
        let page = render_page(&loaded(payload));

        let pane = section(&page, Industry::RealEstate);
        assert!(!pane.contains(" hidden>"));
        assert!(pane.contains(
            "<button class=\"subtab active\" data-subtab=\"jdas_housingmarketinsight\">Housing Market Insight</button>"
        ));
        assert_eq!(pane.matches("<article class=\"card\">").count(), 1);
        assert!(pane.contains("<h3>X</h3>"));
        assert!(page.contains("Loaded 1 update"));

        for industry in Industry::ALL.into_iter().skip(1) {
            assert!(section(&page, industry).contains(" hidden>"), "{industry:?}");
        }
    }

    #[test]
    fn error_state_fills_every_pane_with_placeholder() {
        let mut state = DashboardState::default();
        state.dispatch(DashboardCommand::Reload);
        let token = state.load_token();
        state.dispatch(DashboardCommand::LoadFailed {
            token,
            message: "HTTP 500".to_owned(),
        });

        let page = render_page(&state);
        assert_eq!(page.matches("Error loading data.").count(), Industry::ALL.len());
        assert!(page.contains("status-error"));
        assert!(!page.contains("<article"));
    }

    #[test]
    fn empty_industry_has_placeholder_and_no_subtabs() {
        let payload = SummaryPayload::from_blocks(
            summary_json(&[("real_estate", block_json(Industry::RealEstate, &[]))])["blocks"]
                .as_object()
                .expect("blocks object"),
        );
        let page = render_page(&loaded(payload));

        let pane = section(&page, Industry::RealEstate);
        assert!(pane.contains("<nav class=\"subtabs\"></nav>"));
        assert!(pane.contains("No records found."));
    }

    #[test]
    fn card_fields_are_escaped() {
        let payload = SummaryPayload::new().with_block(
            "ai",
            jdas_app::Block::ok(vec![
                card("jdas_aiindustryinsight", "<script>alert(1)</script>")
                    .with("body", "Tom & Jerry"),
            ]),
        );
        let mut state = loaded(payload);
        state.dispatch(DashboardCommand::SelectIndustry(Industry::Ai));

        let page = render_page(&state);
        let pane = section(&page, Industry::Ai);
        assert!(pane.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(pane.contains("Tom &amp; Jerry"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn card_dates_render_in_display_form() {
        let payload = SummaryPayload::new().with_block(
            "market",
            jdas_app::Block::ok(vec![
                card("jdas_marketinsight", "Rates hold").with("createdOn", fixture_datetime()),
            ]),
        );
        let mut state = loaded(payload);
        state.dispatch(DashboardCommand::SelectIndustry(Industry::Market));

        let page = render_page(&state);
        let pane = section(&page, Industry::Market);
        assert!(pane.contains("<div class=\"meta\">Jan 5, 2026</div>"), "{pane}");
        assert!(!pane.contains(fixture_datetime()));
    }

    #[test]
    fn label_grouping_uses_titles_as_subtabs() {
        let mut state = DashboardState::new(SubtabGrouping::Label);
        state.dispatch(DashboardCommand::Reload);
        let token = state.load_token();
        state.dispatch(DashboardCommand::LoadSucceeded {
            token,
            payload: demo_summary(),
        });

        let page = render_page(&state);
        let pane = section(&page, Industry::RealEstate);
        let subtabs = pane.matches("<button class=\"subtab").count();
        assert!(subtabs >= 1);
        assert_eq!(pane.matches("<button class=\"subtab active\"").count(), 1);
    }
}
