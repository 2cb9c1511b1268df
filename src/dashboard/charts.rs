//! Chart generation and rendering for the dashboard.
//!
//! The spending chart is a bar chart of the category totals of the filtered
//! transactions. It is generated as JSON configuration for the ECharts
//! library and rendered with an HTML container and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger},
    series::bar,
};
use maud::{Markup, PreEscaped, html};

use crate::{dashboard::aggregation::CategoryTotals, html::HeadElement};

const ECHARTS_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@5.6.0/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

impl DashboardChart {
    /// The bar chart of spending per category.
    pub(super) fn category_spending(totals: &CategoryTotals, subtitle: &str) -> Self {
        Self {
            id: "category-spending-chart",
            options: category_spending_chart(totals, subtitle).to_string(),
        }
    }
}

/// Renders the HTML container for a dashboard chart.
pub(super) fn chart_view(chart: &DashboardChart) -> Markup {
    html!(
        div
            id=(chart.id)
            class="w-full min-h-[380px] rounded dark:bg-gray-100"
        {}
    )
}

/// The head elements that load ECharts and draw `chart`.
///
/// The chart is redrawn with the matching theme whenever the browser switches
/// between light and dark mode.
pub(super) fn chart_head_elements(chart: &DashboardChart) -> [HeadElement; 2] {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', () => {{
            const container = document.getElementById("{id}");
            const darkMode = window.matchMedia('(prefers-color-scheme: dark)');
            let chart;

            const draw = () => {{
                if (chart) {{
                    chart.dispose();
                }}
                chart = echarts.init(container, darkMode.matches ? 'dark' : null);
                chart.setOption({options});
            }};

            draw();
            darkMode.addEventListener('change', draw);
            window.addEventListener('resize', () => chart.resize());
        }});"#,
        id = chart.id,
        options = chart.options,
    );

    [
        HeadElement::ScriptLink(ECHARTS_URL.to_owned()),
        HeadElement::ScriptSource(PreEscaped(script)),
    ]
}

/// Categories run down the y-axis so long names stay readable.
fn category_spending_chart(totals: &CategoryTotals, subtitle: &str) -> Chart {
    Chart::new()
        .title(Title::new().text("Spending by category").subtext(subtitle))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(dollars())
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("6%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(dollars())),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(totals.labels.clone()),
        )
        .series(
            bar::Bar::new()
                .name("Spent")
                .data(totals.values.clone()),
        )
}

fn dollars() -> JsFunction {
    JsFunction::new_with_args(
        "amount",
        "return new Intl.NumberFormat('en-US', { style: 'currency', currency: 'USD' })
            .format(amount);",
    )
}
