//! Employee records and the line-based employee data format.
//!
//! Data files hold one record per line as `name,age,salary`:
//!
//! ```text
//! # name, age, salary
//! Jack,18,2222.99
//! Rose,28,5555.99
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// The sample roster in data-file form.
pub const SAMPLE_DATA: &str = include_str!("../specs/employees.data");

/// A decimal amount held as whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Salary {
    cents: i64,
}

impl Salary {
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    pub fn cents(self) -> i64 {
        self.cents
    }
}

impl FromStr for Salary {
    type Err = PipelineError;

    /// Parse `[-]digits[.d[d]]`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || PipelineError::InvalidSalary(s.to_string());

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || frac.len() > 2 || !all_digits(frac) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(invalid)?;

        Ok(Salary::from_cents(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Salary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// An immutable employee record.
///
/// Equality, hashing and the natural ordering are structural over
/// `name`, then `age`, then `salary`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Employee {
    name: String,
    age: u32,
    salary: Salary,
}

impl Employee {
    pub fn new(name: impl Into<String>, age: u32, salary: Salary) -> Self {
        Self {
            name: name.into(),
            age,
            salary,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn salary(&self) -> Salary {
        self.salary
    }

    /// A copy of this record with a different name.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Order by age, breaking ties by name.
    pub fn by_age_then_name(a: &Employee, b: &Employee) -> Ordering {
        a.age.cmp(&b.age).then_with(|| a.name.cmp(&b.name))
    }

    /// Render as a data-file line.
    pub fn to_data_line(&self) -> String {
        format!("{},{},{}", self.name, self.age, self.salary)
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Employee(name={}, age={}, salary={})",
            self.name, self.age, self.salary
        )
    }
}

/// A named employee field, used for filtering and sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Age,
    Salary,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Name => "NAME",
            Field::Age => "AGE",
            Field::Salary => "SALARY",
        }
    }

    /// Look a field up by keyword, ignoring case.
    pub fn from_keyword(word: &str) -> Option<Field> {
        match word.to_uppercase().as_str() {
            "NAME" => Some(Field::Name),
            "AGE" => Some(Field::Age),
            "SALARY" => Some(Field::Salary),
            _ => None,
        }
    }

    /// Compare two employees on this field alone.
    pub fn compare(self, a: &Employee, b: &Employee) -> Ordering {
        match self {
            Field::Name => a.name.cmp(&b.name),
            Field::Age => a.age.cmp(&b.age),
            Field::Salary => a.salary.cmp(&b.salary),
        }
    }
}

/// The seven-record roster used throughout the demonstrations.
///
/// The last two entries are structural duplicates.
pub fn sample_employees() -> Vec<Employee> {
    vec![
        Employee::new("Jack", 18, Salary::from_cents(222_299)),
        Employee::new("Rose", 28, Salary::from_cents(555_599)),
        Employee::new("Tom", 50, Salary::from_cents(444_499)),
        Employee::new("Jax", 16, Salary::from_cents(333_399)),
        Employee::new("Luo", 40, Salary::from_cents(777_799)),
        Employee::new("Luo", 8, Salary::from_cents(777_799)),
        Employee::new("Luo", 8, Salary::from_cents(777_799)),
    ]
}

/// Parse a single `name,age,salary` line.
pub(crate) fn parse_data_line(line: &str) -> std::result::Result<Employee, String> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected name,age,salary but got '{line}'"));
    }

    let name = parts[0];
    if name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    let age: u32 = parts[1]
        .parse()
        .map_err(|_| format!("invalid age '{}'", parts[1]))?;
    let salary = parts[2].parse::<Salary>().map_err(|e: PipelineError| e.to_string())?;

    Ok(Employee::new(name, age, salary))
}

/// Parse employee data text into records.
pub fn parse_employees(text: &str) -> Result<Vec<Employee>> {
    let mut employees = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let employee = parse_data_line(line).map_err(|message| PipelineError::InvalidRecord {
            line: line_num + 1,
            message,
        })?;
        employees.push(employee);
    }

    Ok(employees)
}

/// Read and parse an employee data file.
pub fn load_employees(path: impl AsRef<Path>) -> Result<Vec<Employee>> {
    let text = fs::read_to_string(path)?;
    parse_employees(&text)
}
