use crate::catalog::profile::{ChannelEntry, CurveProfile};

fn entry(
    id: &str,
    name: &str,
    color: &str,
    bounds: (f64, f64),
    current_spend: f64,
    profile: CurveProfile,
) -> ChannelEntry {
    ChannelEntry {
        id: id.into(),
        name: Some(name.into()),
        color: Some(color.into()),
        min_spend: bounds.0,
        max_spend: bounds.1,
        current_spend,
        current_roi: None,
        current_incremental: None,
        profile,
        points: Vec::new(),
    }
}

/// Built-in catalog used when no channel file is supplied.
pub fn default_catalog() -> Vec<ChannelEntry> {
    vec![
        entry(
            "tv",
            "TV",
            "#1f77b4",
            (50_000.0, 500_000.0),
            200_000.0,
            CurveProfile::default(),
        ),
        entry(
            "digital",
            "Digital",
            "#ff7f0e",
            (30_000.0, 400_000.0),
            150_000.0,
            CurveProfile {
                step: 8_000.0,
                base: 6.0,
                decay: 0.9,
                ..Default::default()
            },
        ),
        entry(
            "social",
            "Social",
            "#2ca02c",
            (20_000.0, 300_000.0),
            100_000.0,
            CurveProfile {
                step: 5_000.0,
                base: 5.0,
                decay: 0.7,
                ..Default::default()
            },
        ),
        entry(
            "search",
            "Search",
            "#d62728",
            (40_000.0, 350_000.0),
            120_000.0,
            CurveProfile {
                base: 6.5,
                decay: 1.1,
                ..Default::default()
            },
        ),
        entry(
            "print",
            "Print",
            "#9467bd",
            (10_000.0, 150_000.0),
            60_000.0,
            CurveProfile {
                step: 5_000.0,
                base: 3.5,
                decay: 0.6,
                ..Default::default()
            },
        ),
    ]
}
