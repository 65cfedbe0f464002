use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{Dependent, Draftable, NaturalKey, approval_from_row};
use crate::error::{Error, Result};
use crate::store::{format_datetime, parse_datetime};
use crate::types::patch::merge;
use crate::types::{Approval, NewPerson, Person, PersonPatch};
use crate::validation::{validate_amount, validate_email, validate_required};

const COLUMNS: &str = "id, last_name, first_name, middle_name, email, phone, marketing_expenses,
    advance_expenses, is_approved, created_by_user_id, created_at, updated_at";

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        last_name: row.get(1)?,
        first_name: row.get(2)?,
        middle_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        marketing_expenses: row.get(6)?,
        advance_expenses: row.get(7)?,
        approval: approval_from_row(row, 8)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        updated_at: parse_datetime(&row.get::<_, String>(11)?),
    })
}

fn check_fields(
    last_name: &str,
    first_name: &str,
    email: &str,
    marketing_expenses: Option<f64>,
    advance_expenses: Option<f64>,
) -> Result<()> {
    validate_required(last_name, "last_name")?;
    validate_required(first_name, "first_name")?;
    validate_email(email)?;
    validate_amount(marketing_expenses, "marketing_expenses")?;
    validate_amount(advance_expenses, "advance_expenses")
}

impl Draftable for Person {
    const NAME: &'static str = "Person";
    const TABLE: &'static str = "people";
    const PATH: &'static str = "people";
    const DEPENDENTS: &'static [Dependent] = &[
        Dependent {
            table: "artist_members",
            column: "person_id",
        },
        Dependent {
            table: "track_shares",
            column: "person_id",
        },
    ];

    type New = NewPerson;
    type Patch = PersonPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn approval(&self) -> &Approval {
        &self.approval
    }

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM people WHERE id = ?1"),
            params![id],
            person_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list(conn: &Connection, approved: bool) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM people WHERE is_approved = ?1 ORDER BY last_name, first_name, id"
        ))?;

        let rows = stmt.query_map(params![approved], person_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn validate_new(new: &NewPerson) -> Result<()> {
        check_fields(
            &new.last_name,
            &new.first_name,
            &new.email,
            new.marketing_expenses,
            new.advance_expenses,
        )
    }

    fn new_keys(new: &NewPerson) -> Vec<NaturalKey<'_>> {
        vec![NaturalKey::new("email", &new.email)]
    }

    fn keys(&self) -> Vec<NaturalKey<'_>> {
        vec![NaturalKey::new("email", &self.email)]
    }

    fn changed_keys<'a>(&self, patch: &'a PersonPatch) -> Vec<NaturalKey<'a>> {
        patch
            .email
            .as_deref()
            .filter(|email| *email != self.email)
            .map(|email| NaturalKey::new("email", email))
            .into_iter()
            .collect()
    }

    fn insert(conn: &Connection, new: NewPerson, approval: &Approval) -> Result<i64> {
        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO people (last_name, first_name, middle_name, email, phone,
                marketing_expenses, advance_expenses, is_approved, created_by_user_id,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                new.last_name.trim(),
                new.first_name.trim(),
                new.middle_name,
                new.email,
                new.phone,
                new.marketing_expenses,
                new.advance_expenses,
                approval.is_approved,
                approval.created_by_user_id,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn apply(conn: &Connection, mut person: Person, patch: PersonPatch) -> Result<()> {
        merge(&mut person.last_name, patch.last_name);
        merge(&mut person.first_name, patch.first_name);
        merge(&mut person.middle_name, patch.middle_name);
        merge(&mut person.email, patch.email);
        merge(&mut person.phone, patch.phone);
        merge(&mut person.marketing_expenses, patch.marketing_expenses);
        merge(&mut person.advance_expenses, patch.advance_expenses);

        check_fields(
            &person.last_name,
            &person.first_name,
            &person.email,
            person.marketing_expenses,
            person.advance_expenses,
        )?;

        conn.execute(
            "UPDATE people SET last_name = ?1, first_name = ?2, middle_name = ?3, email = ?4,
                phone = ?5, marketing_expenses = ?6, advance_expenses = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                person.last_name.trim(),
                person.first_name.trim(),
                person.middle_name,
                person.email,
                person.phone,
                person.marketing_expenses,
                person.advance_expenses,
                format_datetime(&Utc::now()),
                person.id,
            ],
        )?;
        Ok(())
    }
}
