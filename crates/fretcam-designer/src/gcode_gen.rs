//! G-code generation from toolpaths.
//!
//! Moves are rendered through a [`PostProfile`]: header and footer come from
//! the profile templates, arcs use its representation and sweep limit, and
//! annotated moves get the requested feed-override treatment.

use fretcam_core::{format_coord, ConfigError, Point, Result, Tool, Units};
use fretcam_postdb::{ArcMode, FeedOverrideMode, PostProfile, PostProfileProvider};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::toolpath::{ArcDirection, ToolpathMove};

/// R words never describe more than this in one block.
const MAX_R_SWEEP_DEG: f64 = 359.0;

/// Machine-side parameters for one emission
///
/// Feeds and spindle speed belong to the tool: they are filled in with
/// [`EmitterSettings::with_tool`] and are not part of the stored settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterSettings {
    /// Retract height for rapids (mm)
    pub safe_z: f64,
    /// Cutting depth (mm)
    pub cut_z: f64,
    /// Base cutting feed (mm/min)
    #[serde(skip)]
    pub feed_rate: f64,
    /// Plunge feed (mm/min)
    #[serde(skip)]
    pub plunge_rate: f64,
    #[serde(skip)]
    pub spindle_rpm: u32,
    /// Lower bound for overridden feeds (mm/min)
    pub min_feed: f64,
    /// Output unit system
    pub units: Units,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            safe_z: 5.0,
            cut_z: -1.0,
            feed_rate: 1200.0,
            plunge_rate: 300.0,
            spindle_rpm: 18000,
            min_feed: 10.0,
            units: Units::Mm,
        }
    }
}

impl EmitterSettings {
    /// Takes the cutting feed, plunge feed and spindle speed from `tool`.
    pub fn with_tool(mut self, tool: &Tool) -> Self {
        self.feed_rate = tool.cutting_feed();
        self.plunge_rate = tool.plunge_rate;
        self.spindle_rpm = tool.spindle_rpm;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.safe_z < self.cut_z {
            return Err(ConfigError::InvalidValue {
                key: "emitter.safe_z".to_string(),
                reason: format!("safe Z {} is below cut Z {}", self.safe_z, self.cut_z),
            });
        }
        if !(self.feed_rate > 0.0) || !(self.plunge_rate > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "emitter.feed_rate".to_string(),
                reason: "feed and plunge rates must be positive".to_string(),
            });
        }
        if !(self.min_feed > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "emitter.min_feed".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Word letter and value pairs of a line, comments removed.
fn line_words(line: &str) -> Vec<(char, f64)> {
    let mut text = String::with_capacity(line.len());
    let mut in_comment = false;
    for c in line.chars() {
        match c {
            '(' => in_comment = true,
            ')' => in_comment = false,
            ';' if !in_comment => break,
            _ if !in_comment => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace()
        .filter_map(|token| {
            let mut chars = token.chars();
            let letter = chars.next()?.to_ascii_uppercase();
            let value = chars.as_str().parse::<f64>().ok()?;
            Some((letter, value))
        })
        .collect()
}

fn has_word(lines: &[String], letter: char, value: f64) -> bool {
    lines
        .iter()
        .any(|l| line_words(l).iter().any(|&(c, v)| c == letter && v == value))
}

fn has_safe_retract(lines: &[String]) -> bool {
    lines.iter().any(|l| {
        let words = line_words(l);
        words.iter().any(|&(c, v)| c == 'G' && v == 0.0) && words.iter().any(|&(c, _)| c == 'Z')
    })
}

/// Renders toolpath moves as G-code for one post profile
#[derive(Debug, Clone)]
pub struct GcodeEmitter {
    profile: PostProfile,
    pub settings: EmitterSettings,
}

/// Per-emission machine state
struct Body {
    lines: Vec<String>,
    position: Option<Point>,
    z: f64,
    feed: Option<f64>,
    in_run: bool,
}

impl GcodeEmitter {
    /// Creates a new G-code emitter.
    pub fn new(profile: PostProfile, settings: EmitterSettings) -> Self {
        Self { profile, settings }
    }

    /// Looks the profile up in an injected table.
    pub fn from_provider(
        provider: &dyn PostProfileProvider,
        profile_id: &str,
        settings: EmitterSettings,
    ) -> std::result::Result<Self, ConfigError> {
        let profile = provider.get_profile(profile_id)?.clone();
        Ok(Self::new(profile, settings))
    }

    pub fn profile(&self) -> &PostProfile {
        &self.profile
    }

    fn coord(&self, mm: f64) -> String {
        format_coord(self.settings.units.from_mm(mm), self.profile.decimals)
    }

    fn feed_word(&self, mm_per_min: f64) -> String {
        format_coord(self.settings.units.from_mm(mm_per_min), 1)
    }

    fn render_template(&self, template: &str) -> String {
        template
            .replace("{units}", self.settings.units.gcode())
            .replace("{positioning}", "G90")
            .replace("{plane}", "G17")
            .replace("{spindle_rpm}", &self.settings.spindle_rpm.to_string())
            .replace("{safe_z}", &self.coord(self.settings.safe_z))
            .replace("{profile}", &self.profile.name)
    }

    /// Header from the profile templates, completed with any mandatory word
    /// the templates leave out.
    pub fn header(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .profile
            .header_lines
            .iter()
            .map(|l| self.render_template(l))
            .collect();

        let units = self.settings.units;
        let units_code: f64 = if units == Units::Inch { 20.0 } else { 21.0 };
        if !has_word(&lines, 'G', units_code) {
            lines.push(units.gcode().to_string());
        }
        if !has_word(&lines, 'G', 90.0) {
            lines.push("G90".to_string());
        }
        if !has_word(&lines, 'G', 17.0) {
            lines.push("G17".to_string());
        }
        if !has_word(&lines, 'M', 3.0) && !has_word(&lines, 'M', 4.0) {
            lines.push(format!("M3 S{}", self.settings.spindle_rpm));
        }
        if !has_safe_retract(&lines) {
            lines.push(format!("G0 Z{}", self.coord(self.settings.safe_z)));
        }
        lines
    }

    /// Footer from the profile templates; a missing retract or spindle stop
    /// is put first.
    pub fn footer(&self) -> Vec<String> {
        let rendered: Vec<String> = self
            .profile
            .footer_lines
            .iter()
            .map(|l| self.render_template(l))
            .collect();
        let mut lines = Vec::with_capacity(rendered.len() + 2);
        if !has_safe_retract(&rendered) {
            lines.push(format!("G0 Z{}", self.coord(self.settings.safe_z)));
        }
        if !has_word(&rendered, 'M', 5.0) {
            lines.push("M5".to_string());
        }
        lines.extend(rendered);
        lines
    }

    /// Generates G-code from a move list.
    ///
    /// `arc_mode` defaults to the profile's own mode. Fails when the profile
    /// does not support the requested feed-override or arc mode.
    pub fn emit(
        &self,
        moves: &[ToolpathMove],
        feed_override: FeedOverrideMode,
        arc_mode: Option<ArcMode>,
    ) -> Result<String> {
        self.profile.validate()?;
        let arc_mode = arc_mode.unwrap_or(self.profile.arc_mode);
        self.profile.check_request(feed_override, arc_mode)?;
        self.settings.validate()?;

        let mut body = Body {
            lines: self.header(),
            position: None,
            z: self.settings.safe_z,
            feed: None,
            in_run: false,
        };

        for mv in moves {
            match mv {
                ToolpathMove::Rapid { end, .. } => {
                    self.close_run(&mut body, feed_override);
                    self.rapid_to(&mut body, *end);
                }
                _ => self.cut(&mut body, mv, feed_override, arc_mode),
            }
        }
        self.close_run(&mut body, feed_override);

        let mut lines = body.lines;
        lines.extend(self.footer());
        let lines = self.number_lines(lines);
        debug!(
            "Emitted {} lines for {} moves with profile {}",
            lines.len(),
            moves.len(),
            self.profile.id
        );

        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }

    fn rapid_to(&self, body: &mut Body, target: Point) {
        let safe_z = self.settings.safe_z;
        if (body.z - safe_z).abs() > 1e-9 {
            body.lines.push(format!("G00 Z{}", self.coord(safe_z)));
            body.z = safe_z;
        }
        if body.position == Some(target) {
            return;
        }
        body.lines.push(format!(
            "G00 X{} Y{}",
            self.coord(target.x),
            self.coord(target.y)
        ));
        body.position = Some(target);
    }

    fn open_run(&self, body: &mut Body, mode: FeedOverrideMode, scale: f64) {
        if body.in_run {
            return;
        }
        body.in_run = true;
        match mode {
            FeedOverrideMode::Comment => body.lines.push("(FEED_HINT START)".to_string()),
            FeedOverrideMode::Mcode => {
                if let Some(pair) = self.profile.mcode {
                    let percent = (scale * 100.0).round() as i64;
                    body.lines.push(format!("M{} P{}", pair.start, percent));
                }
            }
            _ => {}
        }
    }

    fn close_run(&self, body: &mut Body, mode: FeedOverrideMode) {
        if !body.in_run {
            return;
        }
        body.in_run = false;
        match mode {
            FeedOverrideMode::Comment => body.lines.push("(FEED_HINT END)".to_string()),
            FeedOverrideMode::Mcode => {
                if let Some(pair) = self.profile.mcode {
                    body.lines.push(format!("M{} P0", pair.end));
                }
            }
            _ => {}
        }
    }

    fn cut(
        &self,
        body: &mut Body,
        mv: &ToolpathMove,
        feed_override: FeedOverrideMode,
        arc_mode: ArcMode,
    ) {
        let start = mv.start();
        let joined = body
            .position
            .is_some_and(|p| p.distance_to(&start) <= 1e-6);
        if !joined {
            self.close_run(body, feed_override);
            self.rapid_to(body, start);
        }
        if (body.z - self.settings.cut_z).abs() > 1e-9 {
            body.lines.push(format!(
                "G01 Z{} F{}",
                self.coord(self.settings.cut_z),
                self.feed_word(self.settings.plunge_rate)
            ));
            body.z = self.settings.cut_z;
            body.feed = Some(self.settings.plunge_rate);
        }

        let annotations = mv.annotations();
        let annotated = annotations.is_annotated();
        let scale = annotations.feed_scale.unwrap_or(self.profile.feed_scale);
        if annotated {
            self.open_run(body, feed_override, scale);
        } else {
            self.close_run(body, feed_override);
        }

        let base = self.settings.feed_rate;
        let (feed, force) = match feed_override {
            FeedOverrideMode::Inherit if annotated => {
                ((base * self.profile.feed_scale).max(self.settings.min_feed), false)
            }
            FeedOverrideMode::InlineF if annotated => {
                ((base * scale).max(self.settings.min_feed), true)
            }
            _ => (base, false),
        };
        let feed_suffix = if force || body.feed != Some(feed) {
            body.feed = Some(feed);
            format!(" F{}", self.feed_word(feed))
        } else {
            String::new()
        };

        match mv {
            ToolpathMove::Arc {
                end,
                center,
                direction,
                ..
            } => self.arc_lines(body, start, *end, *center, *direction, arc_mode, &feed_suffix),
            _ => {
                let end = mv.end();
                body.lines.push(format!(
                    "G01 X{} Y{}{}",
                    self.coord(end.x),
                    self.coord(end.y),
                    feed_suffix
                ));
            }
        }
        body.position = Some(mv.end());
    }

    /// Splits an arc by the profile's sweep limit and writes one block per piece.
    #[allow(clippy::too_many_arguments)]
    fn arc_lines(
        &self,
        body: &mut Body,
        start: Point,
        end: Point,
        center: Point,
        direction: ArcDirection,
        arc_mode: ArcMode,
        feed_suffix: &str,
    ) {
        let clockwise = direction.is_clockwise();
        let sweep = fretcam_core::arc_sweep(&start, &end, &center, clockwise);
        let radius = start.distance_to(&center);
        let mut limit_deg = self.profile.max_arc_sweep_deg;
        if arc_mode == ArcMode::R {
            limit_deg = limit_deg.min(MAX_R_SWEEP_DEG);
        }
        let limit = limit_deg.to_radians();
        let pieces = ((sweep.abs() / limit) - 1e-9).ceil().max(1.0) as usize;
        let start_angle = (start.y - center.y).atan2(start.x - center.x);
        let code = if clockwise { "G02" } else { "G03" };

        let mut from = start;
        for k in 1..=pieces {
            let to = if k == pieces {
                end
            } else {
                let a = start_angle + sweep * k as f64 / pieces as f64;
                Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
            };
            let suffix = if k == 1 { feed_suffix } else { "" };
            let arc_word = match arc_mode {
                ArcMode::Ij => format!(
                    "I{} J{}",
                    self.coord(center.x - from.x),
                    self.coord(center.y - from.y)
                ),
                ArcMode::R => {
                    let piece_sweep = sweep.abs() / pieces as f64;
                    let r = if piece_sweep > std::f64::consts::PI + 1e-9 {
                        -radius
                    } else {
                        radius
                    };
                    format!("R{}", self.coord(r))
                }
            };
            body.lines.push(format!(
                "{} X{} Y{} {}{}",
                code,
                self.coord(to.x),
                self.coord(to.y),
                arc_word,
                suffix
            ));
            from = to;
        }
    }

    /// Prefixes N words when the profile asks for them.
    fn number_lines(&self, lines: Vec<String>) -> Vec<String> {
        if !self.profile.line_numbers {
            return lines;
        }
        let step = self.profile.line_number_step.max(1);
        let mut n = step;
        lines
            .into_iter()
            .map(|line| {
                if line.starts_with('%') || line.starts_with('(') || line.starts_with('O') {
                    line
                } else {
                    let numbered = format!("N{} {}", n, line);
                    n += step;
                    numbered
                }
            })
            .collect()
    }
}
