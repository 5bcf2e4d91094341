//! DSL parser and executor for employee pipelines.
//!
//! Pipeline format (CMS Pipelines style):
//! ```text
//! PIPE CONSOLE
//! | FILTER AGE > 35
//! | SORT AGE, NAME
//! | CONSOLE
//! ?
//! ```
//!
//! - `PIPE CONSOLE` starts pipeline, reading employee data from input
//! - `| <stage>` continues to next stage
//! - `| CONSOLE` writes to output
//! - `?` on its own line marks end of pipeline
//!
//! Stage position rules:
//! - First stage must be a source: CONSOLE, LITERAL, or HOLE
//! - Any stage can be in the middle (CONSOLE passes through while logging)
//! - Any stage can be last (output discarded if not a sink like CONSOLE)
//!
//! Supported stages:
//! - `CONSOLE` - Read from input (first), pass through (middle), or write to output (last)
//! - `HOLE` - Discard all input, output nothing
//! - `LITERAL name,age,salary` - Emit one record ahead of the stream
//! - `FILTER field op value` - Keep records where the comparison holds
//!   (fields `NAME`, `AGE`, `SALARY`; ops `=`, `!=`, `>`, `>=`, `<`, `<=`)
//! - `TAKE n` - Keep first n records
//! - `SKIP n` - Skip first n records
//! - `PAGE p size` - Keep page p (1-indexed) of the given size
//! - `DISTINCT` - Drop structural duplicates, keeping first occurrence
//! - `SORT [field [ASC|DESC]][, ...]` - Stable sort by keys (natural order if none)
//! - `UPPER` / `LOWER` - Change the case of each name
//! - Stages may also share a line: `PIPE CONSOLE | TAKE 2 | CONSOLE ?`
//! - Lines starting with `#` are comments

use std::cmp::Ordering;

use tracing::debug;

use crate::Pipeline;
use crate::debug_trace::RatDebugTrace;
use crate::error::{PipelineError, Result};
use crate::executor::{execute_rat, execute_rat_traced};
use crate::record::{Employee, Field, Salary, parse_data_line, parse_employees};
use crate::record_stage::{RecordStage, command_to_record_stage};

/// Comparison operator in a FILTER stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    /// Does `field <op> value` hold, given `field.cmp(value)`?
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }
}

/// The right-hand side of a FILTER, typed by the field it tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Name(String),
    Age(u32),
    Salary(Salary),
}

impl FieldValue {
    pub fn field(&self) -> Field {
        match self {
            FieldValue::Name(_) => Field::Name,
            FieldValue::Age(_) => Field::Age,
            FieldValue::Salary(_) => Field::Salary,
        }
    }
}

/// A FILTER predicate: `field op value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub op: CompareOp,
    pub value: FieldValue,
}

impl Condition {
    pub fn matches(&self, employee: &Employee) -> bool {
        let ordering = match &self.value {
            FieldValue::Name(name) => employee.name().cmp(name.as_str()),
            FieldValue::Age(age) => employee.age().cmp(age),
            FieldValue::Salary(salary) => employee.salary().cmp(salary),
        };
        self.op.holds(ordering)
    }
}

/// One key of a SORT stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub descending: bool,
}

/// Compare by each key in turn; with no keys, use natural ordering.
pub fn compare_by_keys(keys: &[SortKey], a: &Employee, b: &Employee) -> Ordering {
    if keys.is_empty() {
        return a.cmp(b);
    }
    keys.iter().fold(Ordering::Equal, |acc, key| {
        acc.then_with(|| {
            let ordering = key.field.compare(a, b);
            if key.descending {
                ordering.reverse()
            } else {
                ordering
            }
        })
    })
}

/// Parsed pipeline command.
#[derive(Debug, Clone)]
pub enum Command {
    /// CONSOLE - Read from input or write to output
    Console,
    /// HOLE - discard all input, output nothing
    Hole,
    /// LITERAL name,age,salary - emit one record ahead of the stream
    Literal { record: Employee },
    /// FILTER field op value
    Filter { condition: Condition },
    /// TAKE n
    Take { n: usize },
    /// SKIP n
    Skip { n: usize },
    /// PAGE p size
    Page { page: usize, size: usize },
    /// DISTINCT
    Distinct,
    /// SORT key [ASC|DESC], ...
    Sort { keys: Vec<SortKey> },
    /// UPPER - uppercase names
    Upper,
    /// LOWER - lowercase names
    Lower,
}

impl Command {
    /// Can this stage be the first stage in a pipeline (source)?
    pub fn can_be_first(&self) -> bool {
        matches!(
            self,
            Command::Console | Command::Literal { .. } | Command::Hole
        )
    }

    /// Get the stage name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Console => "CONSOLE",
            Command::Hole => "HOLE",
            Command::Literal { .. } => "LITERAL",
            Command::Filter { .. } => "FILTER",
            Command::Take { .. } => "TAKE",
            Command::Skip { .. } => "SKIP",
            Command::Page { .. } => "PAGE",
            Command::Distinct => "DISTINCT",
            Command::Sort { .. } => "SORT",
            Command::Upper => "UPPER",
            Command::Lower => "LOWER",
        }
    }
}

/// Parse DSL text into commands.
pub fn parse_commands(text: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Handle "PIPE COMMAND" - extract command after PIPE
        let line = if line.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("PIPE ")) {
            line[5..].trim()
        } else if line.eq_ignore_ascii_case("PIPE") {
            continue;
        } else {
            line
        };

        // Stages are separated by '|', either on one line or as continuation lines
        for segment in line.split('|') {
            let segment = strip_terminator(segment);
            if segment.is_empty() {
                continue;
            }

            let cmd =
                parse_command(segment).map_err(|e| PipelineError::parse(line_num + 1, e))?;
            commands.push(cmd);
        }
    }

    Ok(commands)
}

/// Remove the `?` end-of-pipeline marker. It must stand alone or follow
/// whitespace, so a `?` inside an operand is kept.
fn strip_terminator(segment: &str) -> &str {
    let segment = segment.trim();
    if segment == "?" {
        return "";
    }
    match segment.strip_suffix('?') {
        Some(head) if head.ends_with(char::is_whitespace) => head.trim_end(),
        _ => segment,
    }
}

/// Parse a single command line.
fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };
    let keyword = keyword.to_uppercase();

    let no_operands = |cmd: Command| {
        if rest.is_empty() {
            Ok(cmd)
        } else {
            Err(format!("{} takes no operands", cmd.name()))
        }
    };

    match keyword.as_str() {
        "CONSOLE" => no_operands(Command::Console),
        "HOLE" => no_operands(Command::Hole),
        "DISTINCT" => no_operands(Command::Distinct),
        "UPPER" => no_operands(Command::Upper),
        "LOWER" => no_operands(Command::Lower),
        "LITERAL" => parse_literal(rest),
        "FILTER" => parse_filter(rest),
        "TAKE" => Ok(Command::Take {
            n: parse_count(rest, "TAKE")?,
        }),
        "SKIP" => Ok(Command::Skip {
            n: parse_count(rest, "SKIP")?,
        }),
        "PAGE" => parse_page(rest),
        "SORT" => parse_sort(rest),
        _ => Err(format!("Unknown command: {keyword}")),
    }
}

fn parse_count(rest: &str, stage: &str) -> std::result::Result<usize, String> {
    rest.parse()
        .map_err(|_| format!("{stage} requires a number"))
}

/// Parse LITERAL command.
/// The operand is a data line: `name,age,salary`.
fn parse_literal(rest: &str) -> std::result::Result<Command, String> {
    if rest.is_empty() {
        return Err("LITERAL requires name,age,salary".to_string());
    }
    let record = parse_data_line(rest).map_err(|e| format!("LITERAL {e}"))?;
    Ok(Command::Literal { record })
}

/// Parse FILTER command.
/// Format: FILTER field op value, e.g. `FILTER AGE > 35` or `FILTER NAME = "Luo"`.
fn parse_filter(rest: &str) -> std::result::Result<Command, String> {
    let (field_word, after_field) = rest
        .split_once(char::is_whitespace)
        .ok_or("FILTER requires field, operator and value")?;

    let field = Field::from_keyword(field_word)
        .ok_or_else(|| format!("Unknown field: {field_word} (try NAME, AGE, or SALARY)"))?;

    let after_field = after_field.trim_start();
    // Two-character operators first so ">=" is not read as ">".
    let ops = [
        (">=", CompareOp::Ge),
        ("<=", CompareOp::Le),
        ("!=", CompareOp::Ne),
        ("=", CompareOp::Eq),
        (">", CompareOp::Gt),
        ("<", CompareOp::Lt),
    ];
    let (op, value_part) = ops
        .iter()
        .find_map(|(symbol, op)| after_field.strip_prefix(symbol).map(|v| (*op, v.trim())))
        .ok_or("FILTER requires one of = != > >= < <=")?;

    if value_part.is_empty() {
        return Err("FILTER requires a value".to_string());
    }

    let value = match field {
        Field::Name => {
            let starts_alnum = value_part
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());
            if starts_alnum {
                FieldValue::Name(value_part.to_string())
            } else {
                let (name, rest) = parse_delimited_string(value_part)?;
                if !rest.trim().is_empty() {
                    return Err(format!("FILTER has extra text after name: {}", rest.trim()));
                }
                FieldValue::Name(name)
            }
        }
        Field::Age => FieldValue::Age(
            value_part
                .parse()
                .map_err(|_| format!("Invalid age: {value_part}"))?,
        ),
        Field::Salary => FieldValue::Salary(
            value_part
                .parse()
                .map_err(|e: PipelineError| e.to_string())?,
        ),
    };

    Ok(Command::Filter {
        condition: Condition { op, value },
    })
}

/// Parse PAGE command.
/// Format: PAGE p size
fn parse_page(rest: &str) -> std::result::Result<Command, String> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() != 2 {
        return Err("PAGE requires page number and page size".to_string());
    }
    let page: usize = parts[0].parse().map_err(|_| "Invalid page number")?;
    let size: usize = parts[1].parse().map_err(|_| "Invalid page size")?;
    if page == 0 {
        return Err("PAGE numbers start at 1".to_string());
    }
    Ok(Command::Page { page, size })
}

/// Parse SORT command.
/// Format: SORT [field [ASC|DESC]][, field [ASC|DESC]]...
fn parse_sort(rest: &str) -> std::result::Result<Command, String> {
    let mut keys = Vec::new();

    for key_spec in rest.split(',') {
        let key_spec = key_spec.trim();
        if key_spec.is_empty() {
            if rest.is_empty() {
                break;
            }
            return Err("SORT has an empty key".to_string());
        }

        let words: Vec<&str> = key_spec.split_whitespace().collect();
        let field = Field::from_keyword(words[0])
            .ok_or_else(|| format!("Unknown field: {} (try NAME, AGE, or SALARY)", words[0]))?;
        let descending = match words.get(1).map(|w| w.to_uppercase()).as_deref() {
            None | Some("ASC") => false,
            Some("DESC") => true,
            Some(other) => return Err(format!("SORT direction must be ASC or DESC, got {other}")),
        };
        if words.len() > 2 {
            return Err(format!("SORT key '{key_spec}' has extra words"));
        }

        keys.push(SortKey { field, descending });
    }

    Ok(Command::Sort { keys })
}

/// Parse a delimited string using CMS Pipelines convention.
/// The first non-blank character is the delimiter, and the string
/// continues until the next occurrence of that delimiter.
/// Returns (extracted_string, rest_of_input).
fn parse_delimited_string(s: &str) -> std::result::Result<(String, &str), String> {
    let s = s.trim_start();
    let Some(delim) = s.chars().next() else {
        return Err("Expected delimited string".to_string());
    };
    let after_delim = &s[delim.len_utf8()..];

    match after_delim.find(delim) {
        Some(end) => {
            let extracted = after_delim[..end].to_string();
            let rest = &after_delim[end + delim.len_utf8()..];
            Ok((extracted, rest))
        }
        None => Err(format!("Unclosed delimiter '{delim}'")),
    }
}

type Stream = Box<dyn Iterator<Item = Employee>>;

/// Chain every command onto one lazy pipeline and drain it.
pub fn run_commands(records: Vec<Employee>, commands: &[Command]) -> Vec<Employee> {
    let mut stream: Stream = Box::new(records.into_iter());
    for cmd in commands {
        stream = apply_command(stream, cmd);
    }
    stream.collect()
}

/// Add a single command as a lazy stage.
fn apply_command(stream: Stream, cmd: &Command) -> Stream {
    let pipeline = Pipeline::new(stream);
    match cmd {
        Command::Console => {
            // Console in the middle of pipeline just passes through
            Box::new(pipeline.peek(|e| debug!(record = %e, "CONSOLE")))
        }
        Command::Hole => Box::new(pipeline.filter(|_| false)),
        Command::Literal { record } => Box::new(std::iter::once(record.clone()).chain(pipeline)),
        Command::Filter { condition } => {
            let condition = condition.clone();
            Box::new(pipeline.filter(move |e| condition.matches(e)))
        }
        Command::Take { n } => Box::new(pipeline.limit(*n)),
        Command::Skip { n } => Box::new(pipeline.skip(*n)),
        Command::Page { page, size } => Box::new(pipeline.page(*page, *size)),
        Command::Distinct => Box::new(pipeline.distinct()),
        Command::Sort { keys } => {
            let keys = keys.clone();
            Box::new(pipeline.sorted_by(move |a, b| compare_by_keys(&keys, a, b)))
        }
        Command::Upper => Box::new(pipeline.map(|e| e.with_name(e.name().to_uppercase()))),
        Command::Lower => Box::new(pipeline.map(|e| e.with_name(e.name().to_lowercase()))),
    }
}

/// Validate pipeline structure and produce the source records.
///
/// Returns the source records and the commands after the source.
fn prepare(input_text: &str, pipeline_text: &str) -> Result<(Vec<Employee>, Vec<Command>)> {
    let mut commands = parse_commands(pipeline_text)?;

    if commands.is_empty() {
        return Err(PipelineError::EmptyPipeline);
    }

    // Need at least 2 stages (source and something to receive output)
    if commands.len() < 2 {
        return Err(PipelineError::TooFewStages);
    }

    let first = commands.remove(0);
    if !first.can_be_first() {
        return Err(PipelineError::InvalidSource(first.name()));
    }

    let input_records = match first {
        Command::Console => parse_employees(input_text)?,
        Command::Literal { record } => vec![record],
        // HOLE generates an empty stream
        _ => vec![],
    };

    Ok((input_records, commands))
}

/// Render records one per line.
pub fn format_records(records: &[Employee]) -> String {
    records
        .iter()
        .map(Employee::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Execute a pipeline defined by DSL text on employee data.
///
/// Returns (output_text, input_count, output_count) on success.
pub fn execute_pipeline(input_text: &str, pipeline_text: &str) -> Result<(String, usize, usize)> {
    let (input_records, commands) = prepare(input_text, pipeline_text)?;
    let input_count = input_records.len();

    let output_records = run_commands(input_records, &commands);
    let output_count = output_records.len();
    debug!(input_count, output_count, "batch pipeline complete");

    Ok((format_records(&output_records), input_count, output_count))
}

fn record_stages(commands: &[Command]) -> Vec<Box<dyn RecordStage>> {
    commands.iter().map(command_to_record_stage).collect()
}

/// Execute a pipeline in record-at-a-time mode.
///
/// Returns (output_text, input_count, output_count) on success.
/// Produces identical output to `execute_pipeline` for all pipelines.
pub fn execute_pipeline_rat(
    input_text: &str,
    pipeline_text: &str,
) -> Result<(String, usize, usize)> {
    let (input_records, commands) = prepare(input_text, pipeline_text)?;
    let input_count = input_records.len();

    let mut stages = record_stages(&commands);
    let output_records = execute_rat(input_records, &mut stages);
    let output_count = output_records.len();

    Ok((format_records(&output_records), input_count, output_count))
}

/// Execute a pipeline in record-at-a-time mode with debug tracing.
///
/// Returns (output_text, input_count, output_count, trace) on success.
pub fn execute_pipeline_rat_debug(
    input_text: &str,
    pipeline_text: &str,
) -> Result<(String, usize, usize, RatDebugTrace)> {
    let (input_records, commands) = prepare(input_text, pipeline_text)?;
    let input_count = input_records.len();

    let mut stages = record_stages(&commands);
    let (output_records, trace) = execute_rat_traced(input_records, &mut stages);
    let output_count = output_records.len();

    Ok((format_records(&output_records), input_count, output_count, trace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SAMPLE_DATA;

    fn single(line: &str) -> Command {
        let commands = parse_commands(line).unwrap();
        assert_eq!(commands.len(), 1);
        commands.into_iter().next().unwrap()
    }

    fn output_names(output: &str) -> Vec<String> {
        output
            .lines()
            .map(|l| {
                let start = l.find("name=").unwrap() + 5;
                let end = l[start..].find(',').unwrap() + start;
                l[start..end].to_string()
            })
            .collect()
    }

    #[test]
    fn test_parse_filter_age() {
        match single("FILTER AGE > 35") {
            Command::Filter { condition } => {
                assert_eq!(condition.op, CompareOp::Gt);
                assert_eq!(condition.value, FieldValue::Age(35));
            }
            other => panic!("Expected Filter, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_two_char_ops() {
        match single("filter salary >= 4444.99") {
            Command::Filter { condition } => {
                assert_eq!(condition.op, CompareOp::Ge);
                assert_eq!(condition.value.field(), Field::Salary);
            }
            other => panic!("Expected Filter, got {other:?}"),
        }
        match single("FILTER AGE != 8") {
            Command::Filter { condition } => assert_eq!(condition.op, CompareOp::Ne),
            other => panic!("Expected Filter, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_delimited_name() {
        match single("FILTER NAME = /Luo/") {
            Command::Filter { condition } => {
                assert_eq!(condition.value, FieldValue::Name("Luo".to_string()));
            }
            other => panic!("Expected Filter, got {other:?}"),
        }
        match single("FILTER NAME = Rose") {
            Command::Filter { condition } => {
                assert_eq!(condition.value, FieldValue::Name("Rose".to_string()));
            }
            other => panic!("Expected Filter, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_filter_errors() {
        assert!(parse_commands("FILTER DEPT = x").is_err());
        assert!(parse_commands("FILTER AGE ~ 3").is_err());
        assert!(parse_commands("FILTER AGE >").is_err());
        assert!(parse_commands("FILTER AGE > old").is_err());
        assert!(parse_commands("FILTER NAME = \"Luo").is_err());
        assert!(parse_commands("FILTER NAME = \"Luo\" trailing junk").is_err());
        assert!(parse_commands("FILTER NAME = /Luo/x").is_err());
    }

    #[test]
    fn test_question_mark_in_operand_is_kept() {
        match single("FILTER NAME = Who?") {
            Command::Filter { condition } => {
                assert_eq!(condition.value, FieldValue::Name("Who?".to_string()));
            }
            other => panic!("Expected Filter, got {other:?}"),
        }
        let commands = parse_commands("PIPE CONSOLE | FILTER NAME = Who? | CONSOLE ?").unwrap();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[2], Command::Console));
    }

    #[test]
    fn test_parse_take_skip_page() {
        assert!(matches!(single("TAKE 2"), Command::Take { n: 2 }));
        assert!(matches!(single("SKIP 3"), Command::Skip { n: 3 }));
        assert!(matches!(single("PAGE 4 2"), Command::Page { page: 4, size: 2 }));
        assert!(parse_commands("TAKE many").is_err());
        assert!(parse_commands("PAGE 0 2").is_err());
        assert!(parse_commands("PAGE 2").is_err());
    }

    #[test]
    fn test_parse_sort_keys() {
        match single("SORT AGE DESC, name") {
            Command::Sort { keys } => {
                assert_eq!(
                    keys,
                    vec![
                        SortKey {
                            field: Field::Age,
                            descending: true
                        },
                        SortKey {
                            field: Field::Name,
                            descending: false
                        },
                    ]
                );
            }
            other => panic!("Expected Sort, got {other:?}"),
        }
        assert!(matches!(single("SORT"), Command::Sort { keys } if keys.is_empty()));
        assert!(parse_commands("SORT AGE UP").is_err());
        assert!(parse_commands("SORT AGE,").is_err());
    }

    #[test]
    fn test_parse_literal() {
        match single("LITERAL Boss, 60, 9999.00") {
            Command::Literal { record } => {
                assert_eq!(record.name(), "Boss");
                assert_eq!(record.age(), 60);
            }
            other => panic!("Expected Literal, got {other:?}"),
        }
        assert!(parse_commands("LITERAL").is_err());
    }

    #[test]
    fn test_parse_no_operand_stages() {
        assert!(matches!(single("distinct"), Command::Distinct));
        assert!(matches!(single("| UPPER"), Command::Upper));
        assert!(parse_commands("DISTINCT NAME").is_err());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let text = "PIPE CONSOLE\n| TAKE 2\n| BOGUS\n| CONSOLE\n?";
        match parse_commands(text) {
            Err(PipelineError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("Unknown command"));
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_compare_op_holds() {
        assert!(CompareOp::Ge.holds(Ordering::Equal));
        assert!(CompareOp::Ge.holds(Ordering::Greater));
        assert!(!CompareOp::Lt.holds(Ordering::Equal));
        assert!(CompareOp::Ne.holds(Ordering::Less));
        assert_eq!(CompareOp::Le.symbol(), "<=");
    }

    #[test]
    fn test_execute_pipeline() {
        let pipeline = "PIPE CONSOLE\n| FILTER AGE > 35\n| CONSOLE\n?";
        let (output, input_count, output_count) = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(input_count, 7);
        assert_eq!(output_count, 2);
        assert_eq!(output_names(&output), vec!["Tom", "Luo"]);
    }

    #[test]
    fn test_execute_skip_take_window() {
        let pipeline = "PIPE CONSOLE | SKIP 2 | TAKE 2 | CONSOLE ?";
        let (output, _, _) = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(
            output,
            "Employee(name=Tom, age=50, salary=4444.99)\nEmployee(name=Jax, age=16, salary=3333.99)"
        );
    }

    #[test]
    fn test_execute_sort_age_then_name() {
        let pipeline = "PIPE CONSOLE\n| SORT AGE, NAME\n| CONSOLE";
        let (output, _, _) = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(
            output_names(&output),
            vec!["Luo", "Luo", "Jax", "Jack", "Rose", "Luo", "Tom"]
        );
    }

    #[test]
    fn test_execute_distinct_then_upper() {
        let pipeline = "PIPE CONSOLE\n| FILTER NAME = \"Luo\"\n| DISTINCT\n| UPPER\n| CONSOLE";
        let (output, _, output_count) = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(output_count, 2);
        assert_eq!(output_names(&output), vec!["LUO", "LUO"]);
    }

    #[test]
    fn test_pipeline_requires_source_first() {
        let pipeline = "PIPE TAKE 2\n| CONSOLE";
        let err = execute_pipeline(SAMPLE_DATA, pipeline).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSource("TAKE")));
        assert!(err.to_string().contains("cannot be the first stage"));
    }

    #[test]
    fn test_pipeline_structure_errors() {
        assert!(matches!(
            execute_pipeline(SAMPLE_DATA, "# nothing here\n"),
            Err(PipelineError::EmptyPipeline)
        ));
        assert!(matches!(
            execute_pipeline(SAMPLE_DATA, "PIPE CONSOLE ?"),
            Err(PipelineError::TooFewStages)
        ));
    }

    #[test]
    fn test_bad_input_data_propagates() {
        let err = execute_pipeline("Jack,18,lots\n", "PIPE CONSOLE | CONSOLE").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRecord { line: 1, .. }));
    }

    #[test]
    fn test_literal_as_first_stage() {
        let pipeline = "PIPE LITERAL Boss,60,9999.00\n| CONSOLE";
        let (output, input_count, output_count) = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(input_count, 1);
        assert_eq!(output_count, 1);
        assert_eq!(output, "Employee(name=Boss, age=60, salary=9999.00)");
    }

    #[test]
    fn test_literal_in_middle_prepends() {
        let pipeline = "PIPE CONSOLE\n| TAKE 1\n| LITERAL Boss,60,9999.00\n| CONSOLE";
        let (output, _, _) = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(output_names(&output), vec!["Boss", "Jack"]);
    }

    #[test]
    fn test_hole_as_first_and_last() {
        let (output, input_count, _) = execute_pipeline(SAMPLE_DATA, "PIPE HOLE\n| CONSOLE").unwrap();
        assert_eq!(input_count, 0);
        assert!(output.is_empty());

        let (output, input_count, output_count) =
            execute_pipeline(SAMPLE_DATA, "PIPE CONSOLE\n| HOLE").unwrap();
        assert_eq!(input_count, 7);
        assert_eq!(output_count, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_console_in_middle() {
        let pipeline = "PIPE CONSOLE\n| CONSOLE\n| TAKE 3\n| CONSOLE";
        let (_, _, output_count) = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(output_count, 3);
    }

    #[test]
    fn test_rat_matches_batch() {
        let pipeline = "PIPE CONSOLE\n| SORT SALARY DESC, AGE\n| DISTINCT\n| PAGE 2 2\n| CONSOLE";
        let batch = execute_pipeline(SAMPLE_DATA, pipeline).unwrap();
        let rat = execute_pipeline_rat(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(batch, rat);
    }

    #[test]
    fn test_rat_debug_returns_trace() {
        let pipeline = "PIPE CONSOLE\n| FILTER AGE < 20\n| CONSOLE";
        let (output, input_count, output_count, trace) =
            execute_pipeline_rat_debug(SAMPLE_DATA, pipeline).unwrap();
        assert_eq!(input_count, 7);
        assert_eq!(output_count, 4);
        assert_eq!(output.lines().count(), 4);
        assert_eq!(trace.stage_names, vec!["FILTER", "CONSOLE"]);
        assert_eq!(trace.record_traces.len(), 7);
    }

    #[test]
    fn test_compare_by_keys_natural_when_empty() {
        let roster = crate::record::sample_employees();
        assert_eq!(
            compare_by_keys(&[], &roster[0], &roster[1]),
            roster[0].cmp(&roster[1])
        );
    }
}
