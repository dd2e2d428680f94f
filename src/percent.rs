//! printf-style (`%`) message resolution over pre-rendered arguments.
//!
//! A conversion is `%`, an optional `(name)`, flags from `#0- +`, a width
//! (digits or `*`), an optional `.precision` (digits or `*`), an optional
//! length modifier `h`/`l`/`L`, and one of `diouxXeEfFgGcrsa`. Every
//! conversion consumes one argument, plus one per `*`. Arguments are already
//! strings: numeric conversions parse them back, and fall back to the plain
//! text when that fails.

use std::slice::Iter;

const CONVERSIONS: &str = "diouxXeEfFgGcrsa";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Count {
    Fixed(usize),
    Star,
}

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    alt: bool,
    zero: bool,
    left: bool,
    plus: bool,
    space: bool,
}

#[derive(Debug, Clone, Copy)]
struct Spec {
    flags: Flags,
    width: Option<Count>,
    precision: Option<Count>,
    kind: char,
}

/// Substitute `args` into `template`.
///
/// `%%` becomes `%`. Malformed conversions are copied verbatim without
/// consuming an argument, and so are conversions left once the arguments run
/// out.
pub(crate) fn resolve(template: &str, args: &[String]) -> String {
    let chars: Vec<char> = template.chars().collect();
    let mut args = args.iter();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        if chars.get(i + 1) == Some(&'%') {
            out.push('%');
            i += 2;
            continue;
        }
        match parse(&chars[i + 1..]) {
            Some((spec, len)) => {
                match spec.render(&mut args) {
                    Some(text) => out.push_str(&text),
                    None => out.extend(&chars[i..i + 1 + len]),
                }
                i += 1 + len;
            }
            None => {
                out.push('%');
                i += 1;
            }
        }
    }
    out
}

/// Parse the conversion following a `%`. Returns the spec and the number of
/// characters it spans.
fn parse(chars: &[char]) -> Option<(Spec, usize)> {
    let mut i = 0;

    if chars.first() == Some(&'(') {
        let close = chars.iter().position(|&c| c == ')')?;
        i = close + 1;
    }

    let mut flags = Flags::default();
    while let Some(&c) = chars.get(i) {
        match c {
            '#' => flags.alt = true,
            '0' => flags.zero = true,
            '-' => flags.left = true,
            '+' => flags.plus = true,
            ' ' => flags.space = true,
            _ => break,
        }
        i += 1;
    }

    let width = parse_count(chars, &mut i);

    let precision = if chars.get(i) == Some(&'.') {
        i += 1;
        Some(parse_count(chars, &mut i).unwrap_or(Count::Fixed(0)))
    } else {
        None
    };

    if matches!(chars.get(i), Some('h' | 'l' | 'L')) {
        i += 1;
    }

    let kind = *chars.get(i)?;
    if !CONVERSIONS.contains(kind) {
        return None;
    }

    Some((
        Spec {
            flags,
            width,
            precision,
            kind,
        },
        i + 1,
    ))
}

fn parse_count(chars: &[char], i: &mut usize) -> Option<Count> {
    if chars.get(*i) == Some(&'*') {
        *i += 1;
        return Some(Count::Star);
    }
    let start = *i;
    while chars.get(*i).is_some_and(char::is_ascii_digit) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    let digits: String = chars[start..*i].iter().collect();
    digits.parse().ok().map(Count::Fixed)
}

impl Spec {
    fn render(&self, args: &mut Iter<'_, String>) -> Option<String> {
        let mut flags = self.flags;

        let width = match self.width {
            Some(Count::Star) => {
                let n = parse_int(args.next()?).unwrap_or(0);
                if n < 0 {
                    flags.left = true;
                }
                Some(usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX))
            }
            Some(Count::Fixed(n)) => Some(n),
            None => None,
        };

        let precision = match self.precision {
            Some(Count::Star) => usize::try_from(parse_int(args.next()?).unwrap_or(0)).ok(),
            Some(Count::Fixed(n)) => Some(n),
            None => None,
        };

        let arg = args.next()?;
        Some(self.format(arg, flags, width, precision))
    }

    fn format(
        &self,
        arg: &str,
        flags: Flags,
        width: Option<usize>,
        precision: Option<usize>,
    ) -> String {
        match self.kind {
            'd' | 'i' | 'u' | 'o' | 'x' | 'X' => match parse_int(arg) {
                Some(value) => {
                    let digits = int_digits(value, self.kind, precision);
                    let prefix = match (flags.alt, self.kind) {
                        (true, 'o') => "0o",
                        (true, 'x') => "0x",
                        (true, 'X') => "0X",
                        _ => "",
                    };
                    pad(sign(value < 0, flags), prefix, &digits, width, flags.left, flags.zero)
                }
                None => pad("", "", arg, width, flags.left, false),
            },
            'e' | 'E' | 'f' | 'F' | 'g' | 'G' => match arg.trim().parse::<f64>() {
                Ok(value) => {
                    let negative = value.is_sign_negative() && !value.is_nan();
                    let digits = float_digits(value.abs(), self.kind, precision, flags.alt);
                    let zero = flags.zero && value.is_finite();
                    pad(sign(negative, flags), "", &digits, width, flags.left, zero)
                }
                Err(_) => pad("", "", arg, width, flags.left, false),
            },
            'c' => {
                let text = arg
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| arg.to_string());
                pad("", "", &text, width, flags.left, false)
            }
            _ => {
                let text: String = match precision {
                    Some(p) => arg.chars().take(p).collect(),
                    None => arg.to_string(),
                };
                pad("", "", &text, width, flags.left, false)
            }
        }
    }
}

/// Integers parse directly; decimal text is truncated toward zero.
fn parse_int(arg: &str) -> Option<i128> {
    let arg = arg.trim();
    arg.parse::<i128>().ok().or_else(|| {
        arg.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i128)
    })
}

fn sign(negative: bool, flags: Flags) -> &'static str {
    if negative {
        "-"
    } else if flags.plus {
        "+"
    } else if flags.space {
        " "
    } else {
        ""
    }
}

fn int_digits(value: i128, kind: char, precision: Option<usize>) -> String {
    let magnitude = value.unsigned_abs();
    let digits = match kind {
        'o' => format!("{:o}", magnitude),
        'x' => format!("{:x}", magnitude),
        'X' => format!("{:X}", magnitude),
        _ => magnitude.to_string(),
    };
    match precision {
        Some(p) if digits.len() < p => format!("{}{}", "0".repeat(p - digits.len()), digits),
        _ => digits,
    }
}

/// Render a non-negative float for `e`, `f` or `g` (any case).
fn float_digits(value: f64, kind: char, precision: Option<usize>, alt: bool) -> String {
    let upper = kind.is_ascii_uppercase();
    let text = if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        "inf".to_string()
    } else {
        let p = precision.unwrap_or(6);
        match kind.to_ascii_lowercase() {
            'f' => {
                let mut s = format!("{:.*}", p, value);
                if alt && p == 0 {
                    s.push('.');
                }
                s
            }
            'e' => exponent_form(value, p, alt),
            _ => general_form(value, p, alt),
        }
    };
    if upper {
        text.to_ascii_uppercase()
    } else {
        text
    }
}

/// `d.ddde+XX`, at least two exponent digits.
fn exponent_form(value: f64, precision: usize, alt: bool) -> String {
    let s = format!("{:.*e}", precision, value);
    let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let dot = if alt && precision == 0 { "." } else { "" };
    format!(
        "{}{}e{}{:02}",
        mantissa,
        dot,
        if exp < 0 { '-' } else { '+' },
        exp.abs()
    )
}

fn general_form(value: f64, precision: usize, alt: bool) -> String {
    let p = precision.max(1);
    let exp = if value == 0.0 {
        0
    } else {
        let s = format!("{:.*e}", p - 1, value);
        s.split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };

    let text = if (-4..p as i32).contains(&exp) {
        let decimals = usize::try_from(p as i32 - 1 - exp).unwrap_or(0);
        format!("{:.*}", decimals, value)
    } else {
        exponent_form(value, p - 1, false)
    };

    if alt {
        return text;
    }
    let (mantissa, rest) = match text.find('e') {
        Some(pos) => text.split_at(pos),
        None => (text.as_str(), ""),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    format!("{}{}", mantissa, rest)
}

fn pad(
    sign: &str,
    prefix: &str,
    body: &str,
    width: Option<usize>,
    left: bool,
    zero: bool,
) -> String {
    let len = sign.len() + prefix.len() + body.chars().count();
    let fill = width.unwrap_or(0).saturating_sub(len);

    if left {
        format!("{}{}{}{}", sign, prefix, body, " ".repeat(fill))
    } else if zero {
        format!("{}{}{}{}", sign, prefix, "0".repeat(fill), body)
    } else {
        format!("{}{}{}{}", " ".repeat(fill), sign, prefix, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(template: &str, args: &[&str]) -> String {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        resolve(template, &args)
    }

    #[test]
    fn precision_on_float_keeps_later_args_aligned() {
        assert_eq!(fmt("took %.2f s for %s", &["1.5", "bob"]), "took 1.50 s for bob");
    }

    #[test]
    fn zero_padded_width() {
        assert_eq!(fmt("id=%05d user=%s", &["42", "bob"]), "id=00042 user=bob");
        assert_eq!(fmt("%05d", &["-42"]), "-0042");
    }

    #[test]
    fn string_width_and_alignment() {
        assert_eq!(fmt("[%-10s]", &["abc"]), "[abc       ]");
        assert_eq!(fmt("[%5s]", &["ab"]), "[   ab]");
        assert_eq!(fmt("[%05s]", &["ab"]), "[   ab]");
        assert_eq!(fmt("[%.3s]", &["abcdef"]), "[abc]");
    }

    #[test]
    fn hex_and_octal() {
        assert_eq!(fmt("%x", &["255"]), "ff");
        assert_eq!(fmt("%#X", &["255"]), "0XFF");
        assert_eq!(fmt("%o %#o", &["8", "8"]), "10 0o10");
    }

    #[test]
    fn exponent_notation() {
        assert_eq!(fmt("%e", &["12345.678"]), "1.234568e+04");
        assert_eq!(fmt("%E", &["0.00012"]), "1.200000E-04");
        assert_eq!(fmt("%.1e", &["0"]), "0.0e+00");
    }

    #[test]
    fn general_notation() {
        assert_eq!(fmt("%g", &["1.5"]), "1.5");
        assert_eq!(fmt("%g", &["0.0001"]), "0.0001");
        assert_eq!(fmt("%g", &["0.00001"]), "1e-05");
        assert_eq!(fmt("%g", &["123456789"]), "1.23457e+08");
        assert_eq!(fmt("%G", &["100"]), "100");
    }

    #[test]
    fn default_float_precision_is_six() {
        assert_eq!(fmt("%f", &["2"]), "2.000000");
        assert_eq!(fmt("%F", &["inf"]), "INF");
    }

    #[test]
    fn sign_flags() {
        assert_eq!(fmt("%+d % d %+d", &["5", "5", "-5"]), "+5  5 -5");
    }

    #[test]
    fn integer_conversions_accept_decimal_text() {
        assert_eq!(fmt("%d", &["1.9"]), "1");
        assert_eq!(fmt("%.3d", &["7"]), "007");
        assert_eq!(fmt("%ld items", &["3"]), "3 items");
    }

    #[test]
    fn star_width_and_precision_take_arguments() {
        assert_eq!(fmt("%*d|", &["5", "42"]), "   42|");
        assert_eq!(fmt("%*d|", &["-4", "7"]), "7   |");
        assert_eq!(fmt("%.*f", &["1", "3.14159"]), "3.1");
    }

    #[test]
    fn named_conversion_uses_next_argument() {
        assert_eq!(fmt("%(user)s logged in", &["alice"]), "alice logged in");
    }

    #[test]
    fn char_conversion() {
        assert_eq!(fmt("%c%c", &["72", "i"]), "Hi");
    }

    #[test]
    fn non_numeric_argument_is_substituted_as_text() {
        assert_eq!(fmt("%d and %s", &["abc", "x"]), "abc and x");
        assert_eq!(fmt("[%5d]", &["abc"]), "[  abc]");
    }

    #[test]
    fn malformed_and_exhausted_conversions_stay_verbatim() {
        assert_eq!(fmt("%q %s", &["x"]), "%q x");
        assert_eq!(fmt("%s and %05d", &["x"]), "x and %05d");
        assert_eq!(fmt("100%% of %s", &["x"]), "100% of x");
    }
}
