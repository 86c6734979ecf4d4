//! Frontend-agnostic view model rebuilt from scratch on every change.

use crate::{
    calc::DerivedResults,
    models::{NumericField, Settings},
    number::{format_fixed, format_grouped, format_plain},
};

/// Label of the debug toggle.
pub const DEBUG_TOGGLE_LABEL: &str = "Debug-Modus aktivieren";

/// Notice appended to the results when the ratio formula has no finite answer.
pub const INVALID_RATIO_NOTICE: &str =
    "⚠️ Ungültiges Verhältnis: Verhältnisse und Umrechnungsraten ergeben keinen gültigen Faktor.";

/// A run of text, optionally emphasised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Text of the run.
    pub text: String,
    /// Rendered bold when set.
    pub strong: bool,
}

/// One line of the results panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultLine {
    /// Runs making up the line, in order.
    pub segments: Vec<Segment>,
}

impl ResultLine {
    fn new() -> Self {
        Self::default()
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment {
            text: text.into(),
            strong: false,
        });
        self
    }

    fn strong(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment {
            text: text.into(),
            strong: true,
        });
        self
    }

    /// The line without emphasis markers.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect()
    }
}

/// A text input bound to a numeric settings field.
#[derive(Debug, Clone, PartialEq)]
pub struct InputControl {
    /// Bound field.
    pub field: NumericField,
    /// Label shown above the input.
    pub label: &'static str,
    /// Current stored value rendered as input text.
    pub value: String,
}

/// A checkbox bound to a boolean settings field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleControl {
    /// Label shown next to the checkbox.
    pub label: &'static str,
    /// Whether the box is ticked.
    pub checked: bool,
}

/// Intermediate values of the ratio formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugPanel {
    /// Panel heading.
    pub title: &'static str,
    /// One entry per intermediate value.
    pub lines: Vec<String>,
}

/// Everything the frontend shows, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorView {
    /// Editable numeric inputs.
    pub inputs: Vec<InputControl>,
    /// Debug toggle.
    pub debug_toggle: ToggleControl,
    /// Results panel lines.
    pub results: Vec<ResultLine>,
    /// Present only when debug output is enabled.
    pub debug: Option<DebugPanel>,
}

impl CalculatorView {
    /// Build the full view for `settings`.
    pub fn build(settings: &Settings) -> Self {
        let derived = DerivedResults::compute(settings);

        let inputs = NumericField::EDITABLE
            .iter()
            .map(|&field| InputControl {
                field,
                label: field.label(),
                value: format_plain(settings.get(field)),
            })
            .collect();

        let debug = settings
            .debug_enabled
            .then(|| debug_panel(&derived));

        Self {
            inputs,
            debug_toggle: ToggleControl {
                label: DEBUG_TOGGLE_LABEL,
                checked: settings.debug_enabled,
            },
            results: result_lines(settings, &derived),
            debug,
        }
    }
}

fn result_lines(settings: &Settings, derived: &DerivedResults) -> Vec<ResultLine> {
    let units_a = format_grouped(derived.units_a);
    let units_b = format_grouped(derived.units_b);

    let mut lines = vec![
        ResultLine::new()
            .text("💠 Benötigtes ")
            .strong("Pulver")
            .text(format!(": {}", format_grouped(derived.total_resource))),
        ResultLine::new().text(format!(
            "📐 Verhältnis auf Materialebene: Tender:Timber = {}:{}",
            format_plain(settings.ratio_a),
            format_plain(settings.ratio_b)
        )),
        ResultLine::new()
            .text("🪵 Tender Timber nötig: ")
            .strong(units_a.clone()),
        ResultLine::new()
            .text("🪓 Timber nötig: ")
            .strong(units_b.clone()),
        ResultLine::new().strong("➡️ Zusammenfassung:"),
        ResultLine::new()
            .text("Du brauchst insgesamt ")
            .strong(units_a)
            .text(" Tender Timber und ")
            .strong(units_b)
            .text(" Timber für ")
            .strong(format_grouped(settings.target_quantity))
            .text(" Abidos Timber."),
    ];

    if derived.is_degenerate() {
        lines.push(ResultLine::new().text(INVALID_RATIO_NOTICE));
    }
    lines
}

fn debug_panel(derived: &DerivedResults) -> DebugPanel {
    DebugPanel {
        title: "DEBUG-INFO:",
        lines: vec![
            format!("Gesamtpulver: {}", format_plain(derived.total_resource)),
            format!("Faktor f: {}", format_fixed(derived.factor, 4)),
            format!("Tender Timber gebraucht: {}", format_plain(derived.units_a)),
            format!("Timber gebraucht: {}", format_plain(derived.units_b)),
            format!("Pulver aus Tender: {}", format_fixed(derived.resource_from_a, 2)),
            format!("Pulver aus Timber: {}", format_fixed(derived.resource_from_b, 2)),
            format!(
                "Summe erzeugtes Pulver: {}",
                format_fixed(derived.resource_sum, 2)
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(view: &CalculatorView) -> Vec<String> {
        view.results.iter().map(ResultLine::plain_text).collect()
    }

    #[test]
    fn default_view_lists_inputs_and_results_in_order() {
        let view = CalculatorView::build(&Settings::default());

        let labels: Vec<_> = view.inputs.iter().map(|input| input.label).collect();
        assert_eq!(
            labels,
            [
                "Zielmenge Abidos Timber",
                "Verhältnis Tender Timber",
                "Verhältnis Timber"
            ]
        );
        let values: Vec<_> = view.inputs.iter().map(|input| input.value.as_str()).collect();
        assert_eq!(values, ["1320", "45", "86"]);
        assert!(!view.debug_toggle.checked);
        assert!(view.debug.is_none());

        assert_eq!(
            plain(&view),
            [
                "💠 Benötigtes Pulver: 13.200",
                "📐 Verhältnis auf Materialebene: Tender:Timber = 45:86",
                "🪵 Tender Timber nötig: 4.219",
                "🪓 Timber nötig: 8.062",
                "➡️ Zusammenfassung:",
                "Du brauchst insgesamt 4.219 Tender Timber und 8.062 Timber für 1.320 Abidos Timber.",
            ]
        );
    }

    #[test]
    fn quantities_are_emphasised() {
        let view = CalculatorView::build(&Settings::default());
        let strong: Vec<_> = view.results[5]
            .segments
            .iter()
            .filter(|segment| segment.strong)
            .map(|segment| segment.text.as_str())
            .collect();
        assert_eq!(strong, ["4.219", "8.062", "1.320"]);
        assert!(view.results[4].segments[0].strong);
    }

    #[test]
    fn debug_panel_lists_intermediate_values() {
        let settings = Settings {
            debug_enabled: true,
            ..Settings::default()
        };
        let view = CalculatorView::build(&settings);
        assert!(view.debug_toggle.checked);
        let panel = view.debug.expect("debug panel enabled");
        assert_eq!(panel.title, "DEBUG-INFO:");
        assert_eq!(
            panel.lines,
            [
                "Gesamtpulver: 13200",
                "Faktor f: 93.7500",
                "Tender Timber gebraucht: 4219",
                "Timber gebraucht: 8062",
                "Pulver aus Tender: 6750.40",
                "Pulver aus Timber: 6449.60",
                "Summe erzeugtes Pulver: 13200.00",
            ]
        );
    }

    #[test]
    fn debug_factor_rounds_exact_halves_up() {
        let settings = Settings {
            target_quantity: 1.0,
            ratio_a: 200.0,
            ratio_b: 0.0,
            debug_enabled: true,
            ..Settings::default()
        };
        let panel = CalculatorView::build(&settings)
            .debug
            .expect("debug panel enabled");
        assert_eq!(panel.lines[1], "Faktor f: 0.0313");
        assert_eq!(panel.lines[2], "Tender Timber gebraucht: 6");
        assert_eq!(panel.lines[4], "Pulver aus Tender: 9.60");
    }

    #[test]
    fn degenerate_ratios_add_notice() {
        let settings = Settings {
            ratio_a: 0.0,
            ratio_b: 0.0,
            ..Settings::default()
        };
        let lines = plain(&CalculatorView::build(&settings));
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[2], "🪵 Tender Timber nötig: NaN");
        assert_eq!(lines[6], INVALID_RATIO_NOTICE);
    }

    #[test]
    fn fractional_inputs_render_verbatim() {
        let settings = Settings {
            target_quantity: 12.5,
            ratio_a: 1.5,
            ..Settings::default()
        };
        let view = CalculatorView::build(&settings);
        assert_eq!(view.inputs[0].value, "12.5");
        assert_eq!(view.inputs[1].value, "1.5");
        assert!(plain(&view)[1].ends_with("= 1.5:86"));
        assert!(plain(&view)[5].ends_with("für 13 Abidos Timber."));
    }
}
