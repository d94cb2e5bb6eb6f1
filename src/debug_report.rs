use promptsync::{EntityView, RenderedSegment, TransformResultVerbose, ViewStatus};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(input: &str, res: &TransformResultVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Transforming: \"{}\"", input.trim_end()), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Passes ━━━", ansi::GRAY));
    print_passes(res, &palette);

    println!("\n{}", palette.paint("━━━ Segments ━━━", ansi::GRAY));
    if res.result.inserted == 0 {
        println!("{}", palette.dim("  No placeholders converted"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • No `{{{{` in the input, so every run was gated out");
        println!("  • A name or path broke its grammar (spaces, too long, bad characters)");
        println!("\n{}", palette.dim("  Tip: Set PROMPTSYNC_LOG=promptsync=trace to see gating and selection"));
    } else {
        print_segments(&res.result.segments, &palette);
    }

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Passes: {}  │  Matchers: {}",
        palette.paint(format!("{:?}", res.details.total), ansi::GREEN),
        palette.paint(res.details.passes.len().to_string(), ansi::CYAN),
        palette.dim(res.details.matchers.len().to_string()),
    );
    println!();
}

fn print_passes(res: &TransformResultVerbose, palette: &ansi::Palette) {
    for pass in &res.details.passes {
        println!(
            "  {} {}  {}",
            palette.paint(format!("Pass {}:", pass.pass), ansi::BLUE),
            if pass.replaced > 0 {
                palette.paint(format!("✓ {} converted", pass.replaced), ansi::GREEN)
            } else {
                palette.dim("✗ 0 converted")
            },
            palette.dim(format!("runs {} (gated {})", pass.runs_scanned, pass.runs_gated)),
        );

        for sample in pass.samples.iter().take(5) {
            println!("    {}", palette.dim(sample));
        }
        if pass.samples.len() > 5 {
            println!("    {}", palette.dim(format!("... +{} more", pass.samples.len() - 5)));
        }
    }
}

fn print_segments(segments: &[RenderedSegment], palette: &ansi::Palette) {
    for (idx, seg) in segments.iter().enumerate() {
        let index = palette.paint(format!("[{}]", idx), ansi::GRAY);
        match seg {
            RenderedSegment::Text(text) => println!("  {} {}", index, palette.dim(format!("{text:?}"))),
            RenderedSegment::Entity(view) => {
                println!("  {} {} {} {}", index, fmt_label(view, palette), palette.dim("│"), fmt_status(view, palette));
                println!(
                    "      {} {}  {} {}  {} {}",
                    palette.dim("kind:"),
                    palette.paint(view.kind.name(), ansi::BLUE),
                    palette.dim("│ node:"),
                    palette.paint(view.node_title.as_deref().unwrap_or("-"), ansi::CYAN),
                    palette.dim("│ type:"),
                    palette.paint(view.var_type.map(|t| t.as_str()).unwrap_or("-"), ansi::YELLOW),
                );
            }
        }
    }
}

fn fmt_label(view: &EntityView, palette: &ansi::Palette) -> String {
    let label = palette.bold(palette.paint(&view.label, ansi::GREEN));
    if view.exception { format!("{label} {}", palette.paint("(error branch)", ansi::RED)) } else { label }
}

fn fmt_status(view: &EntityView, palette: &ansi::Palette) -> String {
    match view.status {
        ViewStatus::Ready => palette.paint("ready", ansi::GREEN),
        ViewStatus::Pending => palette.paint("pending metadata", ansi::YELLOW),
        ViewStatus::Invalid => palette.paint("invalid", ansi::RED),
    }
}
