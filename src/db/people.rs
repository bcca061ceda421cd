use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::*;

const PERSON_COLUMNS: &str = "id, national_id, family_card_number, name, alias, gender,
    birth_place, birth_date, marital_status, citizenship, personal_email, phone, phone_alt,
    tax_number, insurance_number, province, regency, district, village, postal_code,
    version, created_by, created_at, updated_by, updated_at";

impl HrDb {
    // =========================================================================
    // Personal records
    // =========================================================================

    pub(crate) fn map_person_row(row: &Row<'_>) -> rusqlite::Result<DbPerson> {
        Ok(DbPerson {
            id: row.get(0)?,
            national_id: row.get(1)?,
            family_card_number: row.get(2)?,
            name: row.get(3)?,
            alias: row.get(4)?,
            gender: row.get(5)?,
            birth_place: row.get(6)?,
            birth_date: row.get(7)?,
            marital_status: row.get(8)?,
            citizenship: row.get(9)?,
            personal_email: row.get(10)?,
            phone: row.get(11)?,
            phone_alt: row.get(12)?,
            tax_number: row.get(13)?,
            insurance_number: row.get(14)?,
            province: row.get(15)?,
            regency: row.get(16)?,
            district: row.get(17)?,
            village: row.get(18)?,
            postal_code: row.get(19)?,
            version: row.get(20)?,
            created_by: row.get(21)?,
            created_at: row.get(22)?,
            updated_by: row.get(23)?,
            updated_at: row.get(24)?,
        })
    }

    /// Get a person by ID.
    pub fn get_person(&self, id: i64) -> Result<Option<DbPerson>, DbError> {
        let sql = format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], Self::map_person_row)
            .optional()?)
    }

    /// Every person whose national ID or family-card number matches one of the
    /// non-empty inputs. More than one row means the two numbers belong to
    /// different people.
    pub fn find_people_by_identity(
        &self,
        national_id: Option<&str>,
        family_card_number: Option<&str>,
    ) -> Result<Vec<DbPerson>, DbError> {
        let national_id = national_id.filter(|v| !v.is_empty());
        let family_card_number = family_card_number.filter(|v| !v.is_empty());
        if national_id.is_none() && family_card_number.is_none() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM people
             WHERE (?1 IS NOT NULL AND national_id = ?1)
                OR (?2 IS NOT NULL AND family_card_number = ?2)
             ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![national_id, family_card_number], Self::map_person_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// First person matching either identity number (OR-match).
    pub fn find_by_identity(
        &self,
        national_id: Option<&str>,
        family_card_number: Option<&str>,
    ) -> Result<Option<DbPerson>, DbError> {
        Ok(self
            .find_people_by_identity(national_id, family_card_number)?
            .into_iter()
            .next())
    }

    /// Create the person when no identity match exists, otherwise update the
    /// matched record in place. The record is shared by every employment of
    /// that person, so an update is visible from all of them.
    pub fn upsert_person(
        &self,
        data: &PersonData,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<DbPerson, DbError> {
        let existing = self.find_by_identity(
            data.national_id.as_deref(),
            data.family_card_number.as_deref(),
        )?;
        match existing {
            Some(person) => self.update_person(person.id, data, person.version, actor, now),
            None => self.insert_person(data, actor, now),
        }
    }

    fn insert_person(
        &self,
        data: &PersonData,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<DbPerson, DbError> {
        self.conn.execute(
            "INSERT INTO people (
                national_id, family_card_number, name, alias, gender, birth_place, birth_date,
                marital_status, citizenship, personal_email, phone, phone_alt, tax_number,
                insurance_number, province, regency, district, village, postal_code,
                version, created_by, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                       ?16, ?17, ?18, ?19, 1, ?20, ?21)",
            params![
                data.national_id,
                data.family_card_number,
                data.name,
                data.alias,
                data.gender,
                data.birth_place,
                data.birth_date,
                data.marital_status,
                data.citizenship,
                data.personal_email,
                data.phone,
                data.phone_alt,
                data.tax_number,
                data.insurance_number,
                data.province,
                data.regency,
                data.district,
                data.village,
                data.postal_code,
                actor,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_person(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Overwrite a person's fields if the stored version still equals
    /// `expected_version`; bumps the version.
    pub fn update_person(
        &self,
        id: i64,
        data: &PersonData,
        expected_version: i64,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<DbPerson, DbError> {
        let changed = self.conn.execute(
            "UPDATE people SET
                national_id = ?1, family_card_number = ?2, name = ?3, alias = ?4, gender = ?5,
                birth_place = ?6, birth_date = ?7, marital_status = ?8, citizenship = ?9,
                personal_email = ?10, phone = ?11, phone_alt = ?12, tax_number = ?13,
                insurance_number = ?14, province = ?15, regency = ?16, district = ?17,
                village = ?18, postal_code = ?19,
                version = version + 1, updated_by = ?20, updated_at = ?21
             WHERE id = ?22 AND version = ?23",
            params![
                data.national_id,
                data.family_card_number,
                data.name,
                data.alias,
                data.gender,
                data.birth_place,
                data.birth_date,
                data.marital_status,
                data.citizenship,
                data.personal_email,
                data.phone,
                data.phone_alt,
                data.tax_number,
                data.insurance_number,
                data.province,
                data.regency,
                data.district,
                data.village,
                data.postal_code,
                actor,
                now,
                id,
                expected_version,
            ],
        )?;
        if changed == 0 {
            return Err(DbError::StaleVersion {
                table: "people",
                id,
                expected: expected_version,
            });
        }
        self.get_person(id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }
}
