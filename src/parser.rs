use crate::ast::{Assignment, Command, CompareOp, Condition, SortDirection, SortKey};
use crate::error::ParseError;
use crate::field::Field;
use crate::record::Record;

/// Operators ordered so that multi-character spellings are tried before
/// their single-character prefixes.
const OPERATORS: [(&str, CompareOp); 8] = [
    ("not_in", CompareOp::NotIn),
    ("in", CompareOp::In),
    ("<=", CompareOp::Le),
    (">=", CompareOp::Ge),
    ("!=", CompareOp::Ne),
    ("<", CompareOp::Lt),
    (">", CompareOp::Gt),
    ("=", CompareOp::Eq),
];

/// Parses one command line into a validated [Command].
///
/// Any syntax or semantic violation (unknown or duplicate field, bad value
/// grammar, disallowed operator, wrong field count) yields a [ParseError];
/// the caller turns that into the `incorrect:'...'` diagnostic.
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim();
    let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (trimmed, ""),
    };

    match keyword {
        "insert" => parse_insert(rest),
        "select" => parse_select(rest),
        "delete" => parse_delete(rest),
        "update" => parse_update(rest),
        "uniq" => parse_uniq(rest),
        "sort" => parse_sort(rest),
        "" => Err(ParseError::EmptyLine),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Splits a `field=value,field=value,...` list into its pieces and the text
/// after it. Commas and whitespace inside a double-quoted string (including
/// escaped quotes) do not split; the first top-level whitespace ends the
/// list.
fn split_assignment_list(input: &str) -> (Vec<&str>, &str) {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in input.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ',' => {
                pieces.push(&input[start..i]);
                start = i + 1;
            }
            c if c.is_whitespace() => {
                pieces.push(&input[start..i]);
                return (pieces, &input[i..]);
            }
            _ => {}
        }
    }

    pieces.push(&input[start..]);
    (pieces, "")
}

/// Splits one `field=value` piece, resolving the field name.
fn parse_assignment(piece: &str) -> Result<(Field, &str), ParseError> {
    let (name, raw_value) = piece
        .split_once('=')
        .ok_or_else(|| ParseError::MalformedAssignment(piece.to_string()))?;
    let field =
        Field::from_name(name).ok_or_else(|| ParseError::UnknownField(name.to_string()))?;
    Ok((field, raw_value))
}

fn parse_insert(rest: &str) -> Result<Command, ParseError> {
    let (pieces, tail) = split_assignment_list(rest);
    if !tail.trim().is_empty() {
        return Err(ParseError::TrailingInput(tail.trim().to_string()));
    }

    let mut values = Vec::with_capacity(pieces.len());
    for piece in &pieces {
        let (field, raw_value) = parse_assignment(piece)?;
        if values.iter().any(|(seen, _)| *seen == field) {
            return Err(ParseError::DuplicateField(field.name()));
        }
        let value = field
            .parse_value(raw_value)
            .map_err(|source| ParseError::BadValue {
                field: field.name(),
                source,
            })?;
        values.push((field, value));
    }

    if values.len() != Field::ALL.len() {
        return Err(ParseError::WrongFieldCount(values.len()));
    }
    let count = values.len();
    let record = Record::from_values(values).ok_or(ParseError::WrongFieldCount(count))?;
    Ok(Command::Insert(record))
}

fn parse_select(rest: &str) -> Result<Command, ParseError> {
    let (field_list, condition_text) = match rest.split_once(char::is_whitespace) {
        Some((fields, conditions)) => (fields, conditions),
        None => (rest, ""),
    };
    if field_list.is_empty() {
        return Err(ParseError::EmptyFieldList);
    }

    // projection lists may repeat fields
    let fields = field_list
        .split(',')
        .map(|name| Field::from_name(name).ok_or_else(|| ParseError::UnknownField(name.into())))
        .collect::<Result<Vec<Field>, ParseError>>()?;
    let conditions = parse_conditions(condition_text)?;

    Ok(Command::Select { fields, conditions })
}

fn parse_delete(rest: &str) -> Result<Command, ParseError> {
    let conditions = parse_conditions(rest)?;
    Ok(Command::Delete { conditions })
}

fn parse_update(rest: &str) -> Result<Command, ParseError> {
    let (pieces, tail) = split_assignment_list(rest);

    let mut assignments: Vec<Assignment> = Vec::with_capacity(pieces.len());
    for piece in &pieces {
        let (field, raw_value) = parse_assignment(piece)?;
        if assignments.iter().any(|a| a.field == field) {
            return Err(ParseError::DuplicateField(field.name()));
        }
        // kept raw: a value that fails its codec skips that field at apply
        // time instead of rejecting the command
        assignments.push(Assignment {
            field,
            raw_value: raw_value.to_string(),
        });
    }

    let conditions = parse_conditions(tail)?;
    Ok(Command::Update {
        assignments,
        conditions,
    })
}

fn parse_uniq(rest: &str) -> Result<Command, ParseError> {
    let fields = parse_distinct_field_list(rest)?;
    Ok(Command::Uniq { fields })
}

fn parse_sort(rest: &str) -> Result<Command, ParseError> {
    let token = single_token(rest)?;

    let mut keys: Vec<SortKey> = Vec::new();
    for piece in token.split(',') {
        let (name, direction) = piece
            .split_once('=')
            .ok_or_else(|| ParseError::MalformedAssignment(piece.to_string()))?;
        let field =
            Field::from_name(name).ok_or_else(|| ParseError::UnknownField(name.to_string()))?;
        if !field.sortable() {
            return Err(ParseError::UnsortableField(field.name()));
        }
        if keys.iter().any(|k| k.field == field) {
            return Err(ParseError::DuplicateField(field.name()));
        }
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(ParseError::BadDirection(other.to_string())),
        };
        keys.push(SortKey { field, direction });
    }

    Ok(Command::Sort { keys })
}

/// Parses whitespace-separated condition tokens `field<op>value`.
fn parse_conditions(text: &str) -> Result<Vec<Condition>, ParseError> {
    text.split_whitespace().map(parse_condition).collect()
}

fn parse_condition(token: &str) -> Result<Condition, ParseError> {
    let field = Field::ALL
        .into_iter()
        .find(|f| token.starts_with(f.name()))
        .ok_or_else(|| ParseError::MalformedCondition(token.to_string()))?;
    let rest = &token[field.name().len()..];

    let (op, raw_value) = OPERATORS
        .iter()
        .find_map(|(spelling, op)| rest.strip_prefix(spelling).map(|raw| (*op, raw)))
        .ok_or_else(|| ParseError::MalformedCondition(token.to_string()))?;

    if !field.allows(op) {
        return Err(ParseError::OperatorNotAllowed {
            field: field.name(),
            op,
        });
    }

    // Relational values are validated now and re-parsed at evaluation time.
    // `in`/`not_in` lists are not: a malformed list matches nothing.
    if !matches!(op, CompareOp::In | CompareOp::NotIn) {
        field
            .parse_value(raw_value)
            .map_err(|source| ParseError::BadValue {
                field: field.name(),
                source,
            })?;
    }

    Ok(Condition {
        field,
        op,
        raw_value: raw_value.to_string(),
    })
}

/// A comma-separated field list that forbids duplicates (`uniq`).
fn parse_distinct_field_list(rest: &str) -> Result<Vec<Field>, ParseError> {
    let token = single_token(rest)?;

    let mut fields: Vec<Field> = Vec::new();
    for name in token.split(',') {
        let field =
            Field::from_name(name).ok_or_else(|| ParseError::UnknownField(name.to_string()))?;
        if fields.contains(&field) {
            return Err(ParseError::DuplicateField(field.name()));
        }
        fields.push(field);
    }
    Ok(fields)
}

fn single_token(rest: &str) -> Result<&str, ParseError> {
    let mut tokens = rest.split_whitespace();
    let first = tokens.next().ok_or(ParseError::EmptyFieldList)?;
    if let Some(extra) = tokens.next() {
        return Err(ParseError::TrailingInput(extra.to_string()));
    }
    Ok(first)
}
