//! Parser for the legacy dive plan token format.
//!
//! The first non-blank line is the free-text description. Everything after it
//! is a stream of numbers separated by commas or whitespace, read in order:
//!
//! - number of gas mixes, then `fO2, fHe, fN2` per mix
//! - O2 deco factor
//! - profile segments, each introduced by a code: `1` depth change
//!   (`start, end, rate, mix`), `2` constant depth (`depth, end run time, mix`),
//!   `99` ends the profile
//! - deco start: `start depth, mix, ascent rate, step size, GF high, GF low`
//! - depth of the next parameter change, then `mix, ascent rate, step size`
//!   for that change, repeated until a change depth of `0`

use nom::{
    bytes::complete::take_while1,
    character::complete::{multispace0, not_line_ending},
    combinator::opt,
    multi::separated_list0,
    number::complete::recognize_float,
    IResult, Parser,
};

use crate::error::DecoError;
use crate::models::{DecoParameters, DivePlan, DiveSegment, GasMix, GasSwitch};

const CODE_DEPTH_CHANGE: i64 = 1;
const CODE_CONSTANT_DEPTH: i64 = 2;
const CODE_END_OF_PROFILE: i64 = 99;

/// Parse and validate a dive plan in the legacy token format.
pub fn parse(input: &str) -> Result<DivePlan, DecoError> {
    let (rest, description) = description(input).map_err(|e| DecoError::Parse {
        token: 1,
        message: format!("parse error: {:?}", e),
    })?;
    let (rest, fields) = fields(rest).map_err(|e| DecoError::Parse {
        token: 2,
        message: format!("parse error: {:?}", e),
    })?;

    let remaining = rest.trim_matches(is_separator);
    if !remaining.is_empty() {
        let snippet: String = remaining.lines().next().unwrap_or_default().chars().take(20).collect();
        return Err(DecoError::Parse {
            token: fields.len() as u32 + 2,
            message: format!("unexpected characters: '{}'", snippet),
        });
    }

    let mut tokens = Tokens { fields, next: 0 };
    let plan = read_plan(description.trim(), &mut tokens)?;
    if tokens.next < tokens.fields.len() {
        return Err(DecoError::Parse {
            token: tokens.position(),
            message: "unexpected value after the final gas switch".to_string(),
        });
    }

    plan.validate()?;
    Ok(plan)
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

fn description(input: &str) -> IResult<&str, &str> {
    let (input, _) = multispace0(input)?;
    not_line_ending(input)
}

fn separator(input: &str) -> IResult<&str, &str> {
    take_while1(is_separator).parse(input)
}

fn field(input: &str) -> IResult<&str, &str> {
    recognize_float(input)
}

fn fields(input: &str) -> IResult<&str, Vec<&str>> {
    let (input, _) = opt(separator).parse(input)?;
    separated_list0(separator, field).parse(input)
}

/// Ordered cursor over the numeric fields.
struct Tokens<'a> {
    fields: Vec<&'a str>,
    next: usize,
}

impl<'a> Tokens<'a> {
    /// 1-based token position of the next field; the description is token 1.
    fn position(&self) -> u32 {
        self.next as u32 + 2
    }

    fn take(&mut self, what: &str) -> Result<&'a str, DecoError> {
        let token = self.fields.get(self.next).copied().ok_or_else(|| DecoError::Parse {
            token: self.position(),
            message: format!("missing {what}"),
        })?;
        self.next += 1;
        Ok(token)
    }

    fn number(&mut self, what: &str) -> Result<f64, DecoError> {
        let position = self.position();
        let token = self.take(what)?;
        token.parse().map_err(|_| DecoError::Parse {
            token: position,
            message: format!("invalid {what}: '{token}'"),
        })
    }

    fn integer(&mut self, what: &str) -> Result<i64, DecoError> {
        let position = self.position();
        let token = self.take(what)?;
        token.parse().map_err(|_| DecoError::Parse {
            token: position,
            message: format!("{what} must be an integer, got '{token}'"),
        })
    }

    fn count(&mut self, what: &str) -> Result<u32, DecoError> {
        let position = self.position();
        let value = self.integer(what)?;
        u32::try_from(value).map_err(|_| DecoError::Parse {
            token: position,
            message: format!("{what} must not be negative, got {value}"),
        })
    }
}

fn read_plan(description: &str, tokens: &mut Tokens<'_>) -> Result<DivePlan, DecoError> {
    let mix_count = tokens.count("gas mix count")?;
    let mut mixes = Vec::new();
    for _ in 0..mix_count {
        let o2 = tokens.number("O2 fraction")?;
        let he = tokens.number("He fraction")?;
        let n2 = tokens.number("N2 fraction")?;
        mixes.push(GasMix::new(o2, he, n2));
    }

    let o2_deco_factor = tokens.number("O2 deco factor")?;

    let mut segments = Vec::new();
    loop {
        let segment = segments.len() as u32 + 1;
        match tokens.integer("profile code")? {
            CODE_DEPTH_CHANGE => segments.push(DiveSegment::DepthChange {
                from_depth: tokens.number("start depth")?,
                to_depth: tokens.number("end depth")?,
                rate: tokens.number("depth change rate")?,
                mix_number: tokens.count("mix number")?,
            }),
            CODE_CONSTANT_DEPTH => segments.push(DiveSegment::ConstantDepth {
                depth: tokens.number("depth")?,
                end_run_time: tokens.number("end run time")?,
                mix_number: tokens.count("mix number")?,
            }),
            CODE_END_OF_PROFILE => break,
            code => return Err(DecoError::UnknownSegmentCode { segment, code }),
        }
    }

    let mut deco = DecoParameters {
        start_depth: tokens.number("deco start depth")?,
        mix_number: tokens.count("deco mix number")?,
        ascent_rate: tokens.number("deco ascent rate")?,
        step_size: tokens.number("step size")?,
        gf_high: tokens.number("GF high")?,
        gf_low: tokens.number("GF low")?,
        switches: Vec::new(),
    };

    let mut switch_depth = tokens.number("gas switch depth")?;
    while switch_depth != 0.0 {
        deco.switches.push(GasSwitch {
            depth: switch_depth,
            mix_number: tokens.count("switch mix number")?,
            ascent_rate: tokens.number("switch ascent rate")?,
            step_size: tokens.number("switch step size")?,
        });
        switch_depth = tokens.number("gas switch depth")?;
    }

    Ok(DivePlan {
        description: description.to_string(),
        mixes,
        o2_deco_factor,
        segments,
        deco,
    })
}
