use relatiq_common::Theme;

/// Theme-dependent colors. Node fills come from the node itself; everything
/// else comes from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub dim_node: &'static str,
    pub edge: &'static str,
    pub dim_edge: &'static str,
    pub text: &'static str,
    pub dim_text: &'static str,
    pub edge_label: &'static str,
    /// Opaque patch behind edge labels. Matches the background.
    pub label_patch: &'static str,
}

pub const LIGHT: Palette = Palette {
    background: "#ffffff",
    dim_node: "#cbd5e1",
    edge: "#cbd5e1",
    dim_edge: "#f1f5f9",
    text: "#1e293b",
    dim_text: "#94a3b8",
    edge_label: "#64748b",
    label_patch: "#ffffff",
};

pub const DARK: Palette = Palette {
    background: "#0f172a",
    dim_node: "#334155",
    edge: "#475569",
    dim_edge: "#1e293b",
    text: "#f1f5f9",
    dim_text: "#475569",
    edge_label: "#94a3b8",
    label_patch: "#0f172a",
};

impl Palette {
    pub fn for_theme(theme: Theme) -> &'static Palette {
        match theme {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        }
    }
}
