//! Interval text parser.
//!
//! Workout text comes one interval per line, e.g.
//!
//! ```text
//! 10min @ 75% FTP
//! 5min from 50 to 100% FTP
//! 3x 1min @ 90% FTP, 1min @ 50% FTP
//! 2min @ 85rpm, 110% FTP
//! 5min free ride
//! ```
//!
//! Each grammar is tried in a fixed priority order at the current position
//! (free ride, ramp, set, steady) and the first one that matches wins. Every
//! parse reports how many bytes it consumed so a set can walk through its
//! comma-separated children.

use crate::workouts::types::{
    FreeRideInterval, Interval, IntervalKind, RampInterval, SetInterval, SteadyInterval, Workout,
    WorkoutParseError,
};

/// A grammar either declines (`Ok(None)`), matches (`Ok(Some)`), or matches
/// but describes an invalid interval (`Err`).
type GrammarResult = Result<Option<(Interval, usize)>, WorkoutParseError>;
type Grammar = fn(&str, &ParseOptions) -> GrammarResult;

/// Variant grammars in dispatch priority order.
const GRAMMARS: &[(IntervalKind, Grammar)] = &[
    (IntervalKind::FreeRide, parse_free_ride),
    (IntervalKind::Ramp, parse_ramp),
    (IntervalKind::Set, parse_set),
    (IntervalKind::Steady, parse_steady),
];

/// Parser settings applied to every interval in a workout.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Round steady targets to the nearest 5 W
    pub round_to_5: bool,
    /// Rewrite absolute watts (`250W`) into %FTP for this FTP before parsing
    pub watts_ftp: Option<u16>,
}

/// Parse a single interval. Anything but whitespace after it is an error.
pub fn parse_interval(text: &str) -> Result<Interval, WorkoutParseError> {
    parse_interval_with(text, &ParseOptions::default())
}

/// Parse a single interval with explicit options.
pub fn parse_interval_with(
    text: &str,
    options: &ParseOptions,
) -> Result<Interval, WorkoutParseError> {
    let normalized = match options.watts_ftp {
        Some(ftp) => normalize_watts(text, ftp),
        None => text.to_string(),
    };

    let (interval, consumed) = parse_interval_prefix_with(&normalized, options)?;
    let rest = normalized[consumed..].trim();
    if !rest.is_empty() {
        return Err(WorkoutParseError::MalformedInterval {
            text: normalized.trim().to_string(),
            reason: format!("unexpected trailing text '{}'", rest),
        });
    }
    Ok(interval)
}

/// Parse one interval from the start of `text`.
///
/// Returns the interval and the number of bytes consumed, so callers can keep
/// parsing what follows.
pub fn parse_interval_prefix(text: &str) -> Result<(Interval, usize), WorkoutParseError> {
    parse_interval_prefix_with(text, &ParseOptions::default())
}

fn parse_interval_prefix_with(
    text: &str,
    options: &ParseOptions,
) -> Result<(Interval, usize), WorkoutParseError> {
    let start = text.len() - text.trim_start().len();
    let body = &text[start..];

    for (kind, grammar) in GRAMMARS {
        if let Some((interval, consumed)) = grammar(body, options)? {
            tracing::trace!("Matched {} interval: {}", kind, interval);
            return Ok((interval, start + consumed));
        }
    }

    Err(WorkoutParseError::MalformedInterval {
        text: body.trim().to_string(),
        reason: "expected a steady, ramp, set or free ride interval".to_string(),
    })
}

/// Parse a list of interval lines into a named workout.
pub fn parse_workout<S: AsRef<str>>(name: &str, lines: &[S]) -> Result<Workout, WorkoutParseError> {
    parse_workout_with(name, lines, &ParseOptions::default())
}

/// Parse a list of interval lines into a named workout with explicit options.
///
/// Blank lines are skipped. The first malformed line aborts the parse.
pub fn parse_workout_with<S: AsRef<str>>(
    name: &str,
    lines: &[S],
    options: &ParseOptions,
) -> Result<Workout, WorkoutParseError> {
    let intervals = lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_interval_with(line, options))
        .collect::<Result<Vec<_>, _>>()?;

    if intervals.is_empty() {
        return Err(WorkoutParseError::EmptyWorkout);
    }

    let workout = Workout::new(name.to_string(), intervals)?;
    tracing::debug!(
        "Parsed workout '{}': {} steps, {}s",
        workout.name,
        workout.steps.len(),
        workout.total_duration_seconds
    );
    Ok(workout)
}

/// Rewrite absolute wattages into %FTP notation.
///
/// `250W` becomes `P% FTP` and `150 to 250W` becomes `P to Q% FTP`, where the
/// percentage is truncated to a whole number. Other text is left untouched.
pub fn normalize_watts(text: &str, ftp: u16) -> String {
    if ftp == 0 {
        return text.to_string();
    }

    let pct = |watts: u32| u64::from(watts) * 100 / u64::from(ftp);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(offset) = rest.find(|c: char| c.is_ascii_digit()) {
        out.push_str(&rest[..offset]);
        let candidate = &rest[offset..];
        let mut sc = Scanner::new(candidate);

        // "<n> to <m>W"
        if let Some(low) = sc.number() {
            let mark = sc.pos;
            if sc.spaces() && sc.keyword("to") && sc.spaces() {
                if let Some(high) = sc.number() {
                    if sc.literal("W") {
                        out.push_str(&format!("{} to {}% FTP", pct(low), pct(high)));
                        rest = &candidate[sc.pos..];
                        continue;
                    }
                }
            }
            sc.pos = mark;
            if sc.literal("W") {
                out.push_str(&format!("{}% FTP", pct(low)));
                rest = &candidate[sc.pos..];
                continue;
            }
            out.push_str(&candidate[..mark]);
            rest = &candidate[mark..];
        } else {
            // Digit run too long for a wattage, pass it through.
            let digits = candidate.bytes().take_while(u8::is_ascii_digit).count();
            out.push_str(&candidate[..digits]);
            rest = &candidate[digits..];
        }
    }
    out.push_str(rest);
    out
}

/// Byte cursor over ASCII grammar tokens.
struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Skip whitespace. Returns true so it can be chained in conditions.
    fn spaces(&mut self) -> bool {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
        true
    }

    fn number(&mut self) -> Option<u32> {
        let digits = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return None;
        }
        let value = self.rest()[..digits].parse().ok()?;
        self.pos += digits;
        Some(value)
    }

    /// Case-insensitive match of an ASCII keyword.
    fn keyword(&mut self, word: &str) -> bool {
        let rest = self.rest().as_bytes();
        if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word.as_bytes()) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    /// Case-sensitive match.
    fn literal(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    /// `<n><unit>` with backtracking when the unit is missing.
    fn quantity(&mut self, unit: &str) -> Option<u32> {
        let mark = self.pos;
        match self.number() {
            Some(n) if self.keyword(unit) => Some(n),
            _ => {
                self.pos = mark;
                None
            }
        }
    }

    /// `[<m>min ][<s>sec ]`
    fn duration(&mut self) -> (Option<u32>, Option<u32>) {
        let minutes = self.quantity("min");
        if minutes.is_some() {
            self.spaces();
        }
        let seconds = self.quantity("sec");
        if seconds.is_some() {
            self.spaces();
        }
        (minutes, seconds)
    }

    /// `@ <c>rpm[,]` with backtracking. Only consumes when the whole group is present.
    fn cadence_group(&mut self) -> Option<u16> {
        let mark = self.pos;
        if self.literal("@") && self.spaces() {
            if let Some(rpm) = self.quantity("rpm") {
                self.spaces();
                self.literal(",");
                self.spaces();
                return u16::try_from(rpm).ok();
            }
        }
        self.pos = mark;
        None
    }

    /// `<c>rpm,` inside a steady interval, after the `@`.
    fn cadence_after_at(&mut self) -> Option<u16> {
        let mark = self.pos;
        if let Some(rpm) = self.quantity("rpm") {
            self.spaces();
            if self.literal(",") {
                self.spaces();
                return u16::try_from(rpm).ok();
            }
        }
        self.pos = mark;
        None
    }

    /// `% FTP`
    fn pct_ftp_suffix(&mut self) -> bool {
        self.literal("%") && self.spaces() && self.keyword("ftp")
    }
}

fn total_seconds(
    minutes: Option<u32>,
    seconds: Option<u32>,
    matched: &str,
) -> Result<u32, WorkoutParseError> {
    if minutes.is_none() && seconds.is_none() {
        return Err(WorkoutParseError::MissingDuration(matched.trim().to_string()));
    }
    let total = minutes
        .unwrap_or(0)
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds.unwrap_or(0)));
    total.ok_or_else(|| WorkoutParseError::InvalidValue {
        field: "duration".to_string(),
        value: matched.trim().to_string(),
    })
}

fn percent(value: u32, matched: &str) -> Result<u16, WorkoutParseError> {
    u16::try_from(value).map_err(|_| WorkoutParseError::InvalidValue {
        field: "percent".to_string(),
        value: matched.trim().to_string(),
    })
}

/// `[time] [@ <c>rpm] free ride`
fn parse_free_ride(text: &str, _options: &ParseOptions) -> GrammarResult {
    let mut sc = Scanner::new(text);
    let (minutes, seconds) = sc.duration();
    let mark = sc.pos;
    let cadence = if sc.literal("@") && sc.spaces() {
        match sc.quantity("rpm") {
            Some(rpm) => u16::try_from(rpm).ok(),
            None => {
                sc.pos = mark;
                None
            }
        }
    } else {
        sc.pos = mark;
        None
    };
    sc.spaces();
    if !(sc.keyword("free") && sc.spaces() && sc.keyword("ride")) {
        return Ok(None);
    }

    let matched = &text[..sc.pos];
    let duration = total_seconds(minutes, seconds, matched)?;
    let interval = FreeRideInterval::new(duration).with_cadence(cadence);
    Ok(Some((Interval::FreeRide(interval), sc.pos)))
}

/// `[time] [@ <c>rpm[,]] from <p>[%] to <q>% FTP`
fn parse_ramp(text: &str, _options: &ParseOptions) -> GrammarResult {
    let mut sc = Scanner::new(text);
    let (minutes, seconds) = sc.duration();
    let cadence = sc.cadence_group();
    if !(sc.keyword("from") && sc.spaces()) {
        return Ok(None);
    }
    let Some(start) = sc.number() else {
        return Ok(None);
    };
    sc.literal("%");
    sc.spaces();
    if !(sc.keyword("to") && sc.spaces()) {
        return Ok(None);
    }
    let Some(end) = sc.number() else {
        return Ok(None);
    };
    if !sc.pct_ftp_suffix() {
        return Ok(None);
    }

    let matched = &text[..sc.pos];
    let duration = total_seconds(minutes, seconds, matched)?;
    let ramp = RampInterval::new(duration, percent(start, matched)?, percent(end, matched)?)
        .with_cadence(cadence);
    Ok(Some((Interval::Ramp(ramp), sc.pos)))
}

/// `<n>x <interval>[, <interval>]...`
///
/// A set swallows the rest of the text; its children are parsed one after
/// another until nothing but separators is left.
fn parse_set(text: &str, options: &ParseOptions) -> GrammarResult {
    let mut sc = Scanner::new(text);
    let Some(reps) = sc.number() else {
        return Ok(None);
    };
    sc.spaces();
    if !sc.keyword("x") {
        return Ok(None);
    }
    if !sc.at_end() && !sc.rest().starts_with(|c: char| c.is_whitespace()) {
        return Ok(None);
    }

    let mut children = Vec::new();
    loop {
        let rest = sc.rest();
        let skipped = rest.len()
            - rest
                .trim_start_matches(|c: char| c.is_whitespace() || c == ',')
                .len();
        sc.pos += skipped;
        if sc.at_end() {
            break;
        }
        let (child, consumed) = parse_interval_prefix_with(sc.rest(), options)?;
        children.push(child);
        sc.pos += consumed;
    }

    if children.is_empty() {
        return Err(WorkoutParseError::MalformedInterval {
            text: text.trim().to_string(),
            reason: "set has no intervals".to_string(),
        });
    }

    let set = SetInterval::new(reps, children)?;
    Ok(Some((Interval::Set(set), sc.pos)))
}

/// `[time] @ [<c>rpm, ]<p>% FTP`
fn parse_steady(text: &str, options: &ParseOptions) -> GrammarResult {
    let mut sc = Scanner::new(text);
    let (minutes, seconds) = sc.duration();
    if !(sc.literal("@") && sc.spaces()) {
        return Ok(None);
    }
    let cadence = sc.cadence_after_at();
    let Some(pct) = sc.number() else {
        return Ok(None);
    };
    if !sc.pct_ftp_suffix() {
        return Ok(None);
    }

    let matched = &text[..sc.pos];
    let duration = total_seconds(minutes, seconds, matched)?;
    let steady = SteadyInterval::new(duration, percent(pct, matched)?)
        .with_cadence(cadence)
        .rounded(options.round_to_5);
    Ok(Some((Interval::Steady(steady), sc.pos)))
}
