use crate::schema::{application_types, applications, beneficiaries, clients, document_links, documents,
                    identification_references, identifications, insurance_beneficiaries, insurances, outbox, passports,
                    persons, products, providers, requisites};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use flow::{FlowError, Transactional};
use insurance_domain::{Application, Beneficiary, DocumentOwner, DocumentRecord, DomainError, IdentificationRecord,
                       IdentificationStatus, InsertOutcome, Insurance, InsuranceStatus, MemoryTables, OutboxEntry,
                       Passport, Person, Product, Requisites, WorkflowScope};
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

#[cfg(feature = "pg")]
type DbConn = diesel::pg::PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = diesel::sqlite::SqliteConnection;
type DbPool = Pool<ConnectionManager<DbConn>>;
type PooledConn = PooledConnection<ConnectionManager<DbConn>>;

// SQLite: el lock de escritura se toma al abrir la transacción.
#[cfg(not(feature = "pg"))]
const BEGIN_SQL: &str = "BEGIN IMMEDIATE";
#[cfg(feature = "pg")]
const BEGIN_SQL: &str = "BEGIN";

#[cfg(not(feature = "pg"))]
#[derive(Debug)]
struct SqlitePragmas;

#[cfg(not(feature = "pg"))]
impl r2d2::CustomizeConnection<DbConn, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut DbConn) -> Result<(), diesel::r2d2::Error> {
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn)
                                                     .map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

/// Almacenamiento relacional Diesel que implementa `Transactional`; cada
/// `begin` toma una conexión del pool y abre una transacción en ella.
#[derive(Clone)]
pub struct DieselWorkflowStore {
  pool: Arc<DbPool>,
}

impl DieselWorkflowStore {
  /// Crea el pool y aplica las migraciones pendientes.
  ///
  /// Con SQLite la URL debe apuntar a un fichero: cada conexión del pool a
  /// `:memory:` vería una base distinta.
  pub fn new(database_url: &str) -> Result<Self, DomainError> {
    let manager = ConnectionManager::<DbConn>::new(database_url);
    #[cfg(not(feature = "pg"))]
    let builder = Pool::builder().max_size(4).connection_customizer(Box::new(SqlitePragmas));
    #[cfg(feature = "pg")]
    let builder = Pool::builder().max_size(8);
    let pool = builder.build(manager).map_err(|e| DomainError::Storage(format!("pool: {}", e)))?;
    let store = DieselWorkflowStore { pool: Arc::new(pool) };
    let mut conn = store.conn()?;
    #[cfg(not(feature = "pg"))]
    let _wal = map_db_err(diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut *conn))?;
    let applied = conn.run_pending_migrations(MIGRATIONS)
                      .map_err(|e| DomainError::Storage(format!("migraciones: {}", e)))?;
    if !applied.is_empty() {
      info!("{} migraciones aplicadas", applied.len());
    }
    drop(conn);
    Ok(store)
  }

  fn conn(&self) -> Result<PooledConn, DomainError> {
    self.pool.get().map_err(|e| DomainError::Storage(format!("pool: {}", e)))
  }

  pub fn seed_provider(&self, code: &str, id: i64) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    map_db_err(diesel::insert_into(providers::table).values((providers::id.eq(id), providers::code.eq(code)))
                                                     .on_conflict_do_nothing()
                                                     .execute(&mut *conn))?;
    Ok(())
  }

  /// Registra el producto y su proveedor. Repetir la siembra no duplica.
  pub fn seed_product(&self, product: &Product) -> Result<(), DomainError> {
    self.seed_provider(&product.provider_code, product.provider_id)?;
    let mut conn = self.conn()?;
    let row = ProductRow { id: product.id,
                           provider_id: product.provider_id,
                           currency: product.currency.clone(),
                           min_sum: product.min_sum,
                           max_sum: product.max_sum,
                           active: product.active };
    map_db_err(diesel::insert_into(products::table).values(&row).on_conflict_do_nothing().execute(&mut *conn))?;
    Ok(())
  }

  pub fn seed_application_type(&self, code: &str, id: i64) -> Result<(), DomainError> {
    let mut conn = self.conn()?;
    map_db_err(diesel::insert_into(application_types::table).values((application_types::id.eq(id),
                                                                     application_types::code.eq(code)))
                                                             .on_conflict_do_nothing()
                                                             .execute(&mut *conn))?;
    Ok(())
  }

  /// Copia el catálogo (productos, proveedores, tipos de solicitud) de un
  /// almacenamiento en memoria.
  pub fn seed_catalog(&self, tables: &MemoryTables) -> Result<(), DomainError> {
    for (code, id) in &tables.providers {
      self.seed_provider(code, *id)?;
    }
    for product in tables.products.values() {
      self.seed_product(product)?;
    }
    for (code, id) in &tables.application_types {
      self.seed_application_type(code, *id)?;
    }
    debug!("catálogo sembrado: {} productos, {} tipos de solicitud",
           tables.products.len(),
           tables.application_types.len());
    Ok(())
  }

  /// Eventos del outbox en orden de escritura.
  pub fn outbox_entries(&self) -> Result<Vec<OutboxEntry>, DomainError> {
    let mut conn = self.conn()?;
    let rows = map_db_err(outbox::table.order((outbox::created_at_ts.asc(), outbox::id.asc()))
                                       .load::<OutboxRow>(&mut *conn))?;
    rows.into_iter().map(OutboxRow::into_entry).collect()
  }
}

impl Transactional for DieselWorkflowStore {
  type Scope = DieselScope;

  fn begin(&self) -> flow::Result<DieselScope> {
    let mut conn = self.pool.get().map_err(|e| FlowError::Storage(format!("pool: {}", e)))?;
    diesel::sql_query(BEGIN_SQL).execute(&mut *conn)
                                .map_err(|e| FlowError::Storage(format!("begin: {}", e)))?;
    Ok(DieselScope { conn, open: true })
  }

  fn commit(&self, mut scope: DieselScope) -> flow::Result<()> {
    diesel::sql_query("COMMIT").execute(scope.conn())
                               .map_err(|e| FlowError::Storage(format!("commit: {}", e)))?;
    scope.open = false;
    Ok(())
  }

  fn rollback(&self, mut scope: DieselScope) -> flow::Result<()> {
    scope.open = false;
    diesel::sql_query("ROLLBACK").execute(scope.conn())
                                 .map_err(|e| FlowError::Storage(format!("rollback: {}", e)))?;
    Ok(())
  }
}

/// Transacción abierta sobre una conexión del pool. Si se descarta sin
/// `commit` ni `rollback`, la transacción se deshace al soltarla.
pub struct DieselScope {
  conn: PooledConn,
  open: bool,
}

impl DieselScope {
  fn conn(&mut self) -> &mut DbConn {
    &mut self.conn
  }
}

impl Drop for DieselScope {
  fn drop(&mut self) {
    if self.open {
      if let Err(e) = diesel::sql_query("ROLLBACK").execute(self.conn()) {
        warn!("rollback al soltar la transacción falló: {}", e);
      }
    }
  }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = products)]
struct ProductRow {
  id: i64,
  provider_id: i64,
  currency: String,
  min_sum: f64,
  max_sum: f64,
  active: bool,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = requisites)]
struct RequisitesRow {
  id: String,
  bic: String,
  bank_name: String,
  account: String,
  corr_account: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = clients)]
struct ClientRow {
  id: String,
  external_client_id: i64,
  profile: String,
  created_at_ts: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = persons)]
struct PersonRow {
  id: String,
  name: String,
  surname: String,
  birth_date: String,
  profile: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = passports)]
struct PassportRow {
  id: String,
  owner_id: String,
  series: String,
  number: String,
  issued_by: String,
  issue_date: String,
  department_code: String,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = identifications)]
struct IdentificationRow {
  id: String,
  client_id: String,
  external_client_id: i64,
  provider_id: i64,
  provider: String,
  status: String,
  created_at_ts: i64,
}

impl IdentificationRow {
  fn from_record(r: &IdentificationRecord) -> Self {
    Self { id: r.id.to_string(),
           client_id: r.client_id.to_string(),
           external_client_id: r.external_client_id,
           provider_id: r.provider_id,
           provider: r.provider.clone(),
           status: r.status.as_str().to_string(),
           created_at_ts: r.created_at.timestamp_micros() }
  }

  fn into_record(self) -> Result<IdentificationRecord, DomainError> {
    Ok(IdentificationRecord { id: parse_id(&self.id)?,
                              client_id: parse_id(&self.client_id)?,
                              external_client_id: self.external_client_id,
                              provider_id: self.provider_id,
                              provider: self.provider,
                              status: self.status.parse::<IdentificationStatus>()?,
                              created_at: from_micros(self.created_at_ts)? })
  }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
struct DocumentRow {
  id: String,
  name: String,
  storage_key: String,
  content_type: String,
  doc_type: String,
  created_at_ts: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document_links)]
struct DocumentLinkRow {
  owner_kind: String,
  owner_id: String,
  document_id: String,
  linked_at_ts: i64,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = beneficiaries)]
struct BeneficiaryRow {
  id: String,
  name: String,
  surname: String,
  patronymic: Option<String>,
  birth_date: String,
  share: f64,
  relation: String,
  position: i32,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = insurances)]
struct InsuranceRow {
  id: String,
  requisites_id: String,
  insured_person_id: Option<String>,
  status: String,
  currency: String,
  duration_years: i32,
  client_id: i64,
  customer_id: String,
  insurance_sum: f64,
  contract_number: String,
  product_id: i64,
  provider_id: i64,
  created_at_ts: i64,
}

impl InsuranceRow {
  fn into_insurance(self) -> Result<Insurance, DomainError> {
    Ok(Insurance { id: parse_id(&self.id)?,
                   requisites_id: parse_id(&self.requisites_id)?,
                   insured_person_id: self.insured_person_id.as_deref().map(parse_id).transpose()?,
                   status: self.status.parse::<InsuranceStatus>()?,
                   currency: self.currency,
                   duration_years: self.duration_years,
                   client_id: self.client_id,
                   customer_id: parse_id(&self.customer_id)?,
                   sum: self.insurance_sum,
                   contract_number: self.contract_number,
                   product_id: self.product_id,
                   provider_id: self.provider_id,
                   created_at: from_micros(self.created_at_ts)? })
  }
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = applications)]
struct ApplicationRow {
  id: String,
  insurance_id: String,
  application_type_id: i64,
  status: String,
  created_at_ts: i64,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = outbox)]
struct OutboxRow {
  id: String,
  reference_id: i64,
  event: String,
  created_at_ts: i64,
}

impl OutboxRow {
  fn into_entry(self) -> Result<OutboxEntry, DomainError> {
    Ok(OutboxEntry { id: parse_id(&self.id)?,
                     reference_id: self.reference_id,
                     event: self.event.parse::<IdentificationStatus>()?,
                     created_at: from_micros(self.created_at_ts)? })
  }
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T, DomainError> {
  res.map_err(|e| DomainError::Storage(format!("db: {}", e)))
}

fn parse_id(s: &str) -> Result<Uuid, DomainError> {
  Uuid::parse_str(s).map_err(|e| DomainError::SerializationError(format!("uuid '{}': {}", s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DomainError::SerializationError(format!("fecha '{}': {}", s, e)))
}

fn from_micros(ts: i64) -> Result<DateTime<Utc>, DomainError> {
  DateTime::<Utc>::from_timestamp_micros(ts).ok_or_else(|| {
                                                DomainError::SerializationError(format!("marca de tiempo fuera de rango: {}",
                                                                                        ts))
                                              })
}

fn parse_ids(ids: Vec<String>) -> Result<Vec<Uuid>, DomainError> {
  let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
  for s in ids {
    let id = parse_id(&s)?;
    if !out.contains(&id) {
      out.push(id);
    }
  }
  Ok(out)
}

impl WorkflowScope for DieselScope {
  fn find_product(&mut self, id: i64) -> Result<Option<Product>, DomainError> {
    let row = map_db_err(products::table.find(id).first::<ProductRow>(self.conn()).optional())?;
    let Some(r) = row else {
      return Ok(None);
    };
    let code = map_db_err(providers::table.find(r.provider_id)
                                          .select(providers::code)
                                          .first::<String>(self.conn())
                                          .optional())?;
    Ok(Some(Product { id: r.id,
                      provider_id: r.provider_id,
                      provider_code: code.unwrap_or_default(),
                      currency: r.currency,
                      min_sum: r.min_sum,
                      max_sum: r.max_sum,
                      active: r.active }))
  }

  fn find_provider_id(&mut self, code: &str) -> Result<Option<i64>, DomainError> {
    map_db_err(providers::table.filter(providers::code.eq(code))
                               .select(providers::id)
                               .first::<i64>(self.conn())
                               .optional())
  }

  fn find_application_type_id(&mut self, code: &str) -> Result<Option<i64>, DomainError> {
    map_db_err(application_types::table.filter(application_types::code.eq(code))
                                       .select(application_types::id)
                                       .first::<i64>(self.conn())
                                       .optional())
  }

  fn find_requisites_by_bic(&mut self, bic: &str) -> Result<Option<Uuid>, DomainError> {
    let id = map_db_err(requisites::table.filter(requisites::bic.eq(bic))
                                         .select(requisites::id)
                                         .first::<String>(self.conn())
                                         .optional())?;
    id.as_deref().map(parse_id).transpose()
  }

  fn insert_requisites(&mut self, req: &Requisites) -> Result<InsertOutcome, DomainError> {
    let id = Uuid::new_v4();
    let row = RequisitesRow { id: id.to_string(),
                              bic: req.bic.clone(),
                              bank_name: req.bank_name.clone(),
                              account: req.account.clone(),
                              corr_account: req.corr_account.clone() };
    let inserted = map_db_err(diesel::insert_into(requisites::table).values(&row)
                                                                    .on_conflict_do_nothing()
                                                                    .execute(self.conn()))?;
    if inserted == 0 {
      debug!("requisitos con BIC {} ya existentes", req.bic);
      return Ok(InsertOutcome::AlreadyExists);
    }
    Ok(InsertOutcome::Inserted(id))
  }

  fn insert_client(&mut self, external_client_id: i64, person: &Person) -> Result<Uuid, DomainError> {
    let id = Uuid::new_v4();
    let row = ClientRow { id: id.to_string(),
                          external_client_id,
                          profile: serde_json::to_string(&person.profile())?,
                          created_at_ts: Utc::now().timestamp_micros() };
    map_db_err(diesel::insert_into(clients::table).values(&row).execute(self.conn()))?;
    self.insert_passport(id, &person.passport)?;
    Ok(id)
  }

  fn insert_person(&mut self, person: &Person) -> Result<Uuid, DomainError> {
    let id = Uuid::new_v4();
    let row = PersonRow { id: id.to_string(),
                          name: person.name.clone(),
                          surname: person.surname.clone(),
                          birth_date: person.birth_date.to_string(),
                          profile: serde_json::to_string(&person.profile())? };
    map_db_err(diesel::insert_into(persons::table).values(&row).execute(self.conn()))?;
    Ok(id)
  }

  fn insert_passport(&mut self, owner_id: Uuid, passport: &Passport) -> Result<Uuid, DomainError> {
    let id = Uuid::new_v4();
    let row = PassportRow { id: id.to_string(),
                            owner_id: owner_id.to_string(),
                            series: passport.series.clone(),
                            number: passport.number.clone(),
                            issued_by: passport.issued_by.clone(),
                            issue_date: passport.issue_date.to_string(),
                            department_code: passport.department_code.clone() };
    map_db_err(diesel::insert_into(passports::table).values(&row).execute(self.conn()))?;
    Ok(id)
  }

  fn find_identification(&mut self,
                         external_client_id: i64,
                         provider: &str)
                         -> Result<Option<IdentificationRecord>, DomainError> {
    let row = map_db_err(identifications::table.filter(identifications::external_client_id.eq(external_client_id))
                                               .filter(identifications::provider.eq(provider))
                                               .order(identifications::created_at_ts.desc())
                                               .first::<IdentificationRow>(self.conn())
                                               .optional())?;
    row.map(IdentificationRow::into_record).transpose()
  }

  fn find_identification_by_id(&mut self, id: Uuid) -> Result<Option<IdentificationRecord>, DomainError> {
    let row = map_db_err(identifications::table.find(id.to_string())
                                               .first::<IdentificationRow>(self.conn())
                                               .optional())?;
    row.map(IdentificationRow::into_record).transpose()
  }

  fn insert_identification(&mut self, record: &IdentificationRecord) -> Result<(), DomainError> {
    let row = IdentificationRow::from_record(record);
    map_db_err(diesel::insert_into(identifications::table).values(&row).execute(self.conn()))?;
    Ok(())
  }

  fn insert_reference(&mut self, reference_id: i64, identification_id: Uuid) -> Result<InsertOutcome, DomainError> {
    let inserted = map_db_err(diesel::insert_into(identification_references::table)
                                .values((identification_references::reference_id.eq(reference_id),
                                         identification_references::identification_id.eq(identification_id.to_string())))
                                .on_conflict_do_nothing()
                                .execute(self.conn()))?;
    if inserted == 0 {
      return Ok(InsertOutcome::AlreadyExists);
    }
    Ok(InsertOutcome::Inserted(identification_id))
  }

  fn references_of(&mut self, identification_id: Uuid) -> Result<Vec<i64>, DomainError> {
    map_db_err(identification_references::table
                 .filter(identification_references::identification_id.eq(identification_id.to_string()))
                 .select(identification_references::reference_id)
                 .order(identification_references::reference_id.asc())
                 .load::<i64>(self.conn()))
  }

  fn insert_documents(&mut self, records: &[DocumentRecord]) -> Result<(), DomainError> {
    for r in records {
      let row = DocumentRow { id: r.id.to_string(),
                              name: r.name.clone(),
                              storage_key: r.storage_key.clone(),
                              content_type: r.content_type.clone(),
                              doc_type: r.doc_type.clone(),
                              created_at_ts: r.created_at.timestamp_micros() };
      map_db_err(diesel::insert_into(documents::table).values(&row).execute(self.conn()))?;
    }
    Ok(())
  }

  fn link_documents(&mut self, owner: DocumentOwner, document_ids: &[Uuid]) -> Result<(), DomainError> {
    // el orden de vinculación se conserva con marcas consecutivas
    let base = Utc::now().timestamp_micros();
    for (i, id) in document_ids.iter().enumerate() {
      let exists = map_db_err(documents::table.find(id.to_string())
                                              .select(documents::id)
                                              .first::<String>(self.conn())
                                              .optional())?;
      if exists.is_none() {
        return Err(DomainError::Storage(format!("documento {} inexistente", id)));
      }
      let row = DocumentLinkRow { owner_kind: owner.kind().to_string(),
                                  owner_id: owner.id().to_string(),
                                  document_id: id.to_string(),
                                  linked_at_ts: base + i as i64 };
      map_db_err(diesel::insert_into(document_links::table).values(&row)
                                                           .on_conflict_do_nothing()
                                                           .execute(self.conn()))?;
    }
    Ok(())
  }

  fn client_document_ids(&mut self, external_client_id: i64) -> Result<Vec<Uuid>, DomainError> {
    let client_ids = map_db_err(clients::table.filter(clients::external_client_id.eq(external_client_id))
                                              .select(clients::id)
                                              .load::<String>(self.conn()))?;
    if client_ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids = map_db_err(document_links::table.filter(document_links::owner_kind.eq("client"))
                                              .filter(document_links::owner_id.eq_any(client_ids))
                                              .order((document_links::linked_at_ts.asc(), document_links::document_id.asc()))
                                              .select(document_links::document_id)
                                              .load::<String>(self.conn()))?;
    parse_ids(ids)
  }

  fn document_ids_of(&mut self, owner: DocumentOwner) -> Result<Vec<Uuid>, DomainError> {
    let ids = map_db_err(document_links::table.filter(document_links::owner_kind.eq(owner.kind()))
                                              .filter(document_links::owner_id.eq(owner.id().to_string()))
                                              .order((document_links::linked_at_ts.asc(), document_links::document_id.asc()))
                                              .select(document_links::document_id)
                                              .load::<String>(self.conn()))?;
    parse_ids(ids)
  }

  fn insert_beneficiaries(&mut self, list: &[Beneficiary]) -> Result<Vec<Uuid>, DomainError> {
    let mut ids = Vec::with_capacity(list.len());
    for (i, b) in list.iter().enumerate() {
      let id = Uuid::new_v4();
      let row = BeneficiaryRow { id: id.to_string(),
                                 name: b.name.clone(),
                                 surname: b.surname.clone(),
                                 patronymic: b.patronymic.clone(),
                                 birth_date: b.birth_date.to_string(),
                                 share: b.share,
                                 relation: b.relation.clone(),
                                 position: i as i32 };
      map_db_err(diesel::insert_into(beneficiaries::table).values(&row).execute(self.conn()))?;
      ids.push(id);
    }
    Ok(ids)
  }

  fn link_beneficiaries(&mut self, insurance_id: Uuid, beneficiary_ids: &[Uuid]) -> Result<(), DomainError> {
    for id in beneficiary_ids {
      map_db_err(diesel::insert_into(insurance_beneficiaries::table)
                   .values((insurance_beneficiaries::insurance_id.eq(insurance_id.to_string()),
                            insurance_beneficiaries::beneficiary_id.eq(id.to_string())))
                   .on_conflict_do_nothing()
                   .execute(self.conn()))?;
    }
    Ok(())
  }

  fn beneficiaries_of(&mut self, insurance_id: Uuid) -> Result<Vec<Beneficiary>, DomainError> {
    let ids = map_db_err(insurance_beneficiaries::table
                           .filter(insurance_beneficiaries::insurance_id.eq(insurance_id.to_string()))
                           .select(insurance_beneficiaries::beneficiary_id)
                           .load::<String>(self.conn()))?;
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let rows = map_db_err(beneficiaries::table.filter(beneficiaries::id.eq_any(ids))
                                              .order(beneficiaries::position.asc())
                                              .load::<BeneficiaryRow>(self.conn()))?;
    rows.into_iter()
        .map(|r| {
          Ok(Beneficiary { name: r.name,
                           surname: r.surname,
                           patronymic: r.patronymic,
                           birth_date: parse_date(&r.birth_date)?,
                           share: r.share,
                           relation: r.relation })
        })
        .collect()
  }

  fn insert_insurance(&mut self, ins: &Insurance) -> Result<(), DomainError> {
    let row = InsuranceRow { id: ins.id.to_string(),
                             requisites_id: ins.requisites_id.to_string(),
                             insured_person_id: ins.insured_person_id.map(|id| id.to_string()),
                             status: ins.status.as_str().to_string(),
                             currency: ins.currency.clone(),
                             duration_years: ins.duration_years,
                             client_id: ins.client_id,
                             customer_id: ins.customer_id.to_string(),
                             insurance_sum: ins.sum,
                             contract_number: ins.contract_number.clone(),
                             product_id: ins.product_id,
                             provider_id: ins.provider_id,
                             created_at_ts: ins.created_at.timestamp_micros() };
    map_db_err(diesel::insert_into(insurances::table).values(&row).execute(self.conn()))?;
    Ok(())
  }

  fn find_insurance(&mut self, id: Uuid) -> Result<Option<Insurance>, DomainError> {
    let row = map_db_err(insurances::table.find(id.to_string()).first::<InsuranceRow>(self.conn()).optional())?;
    row.map(InsuranceRow::into_insurance).transpose()
  }

  fn insert_application(&mut self, app: &Application) -> Result<(), DomainError> {
    let row = ApplicationRow { id: app.id.to_string(),
                               insurance_id: app.insurance_id.to_string(),
                               application_type_id: app.application_type_id,
                               status: app.status.clone(),
                               created_at_ts: app.created_at.timestamp_micros() };
    map_db_err(diesel::insert_into(applications::table).values(&row).execute(self.conn()))?;
    Ok(())
  }

  fn find_application(&mut self, id: Uuid) -> Result<Option<Application>, DomainError> {
    let row = map_db_err(applications::table.find(id.to_string()).first::<ApplicationRow>(self.conn()).optional())?;
    let Some(r) = row else {
      return Ok(None);
    };
    Ok(Some(Application { id: parse_id(&r.id)?,
                          insurance_id: parse_id(&r.insurance_id)?,
                          application_type_id: r.application_type_id,
                          status: r.status,
                          created_at: from_micros(r.created_at_ts)? }))
  }

  fn insert_outbox(&mut self, entry: &OutboxEntry) -> Result<(), DomainError> {
    let row = OutboxRow { id: entry.id.to_string(),
                          reference_id: entry.reference_id,
                          event: entry.event.as_str().to_string(),
                          created_at_ts: entry.created_at.timestamp_micros() };
    map_db_err(diesel::insert_into(outbox::table).values(&row).execute(self.conn()))?;
    Ok(())
  }
}

/// Crea el almacenamiento a partir de `WORKFLOW_DB_URL` (o `DATABASE_URL`).
#[cfg(feature = "pg")]
pub fn new_from_env() -> Result<DieselWorkflowStore, DomainError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("WORKFLOW_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                            .map_err(|_| {
                                              DomainError::Storage("WORKFLOW_DB_URL / DATABASE_URL no definida".into())
                                            })?;
  let l = url.to_lowercase();
  if !(l.starts_with("postgres") || url.contains('@')) {
    return Err(DomainError::Storage("WORKFLOW_DB_URL no parece una URL de Postgres".into()));
  }
  DieselWorkflowStore::new(&url)
}

/// Crea el almacenamiento a partir de `WORKFLOW_DB_URL` (o `DATABASE_URL`);
/// sin ninguna de las dos usa `insurance.db` en el directorio actual.
#[cfg(not(feature = "pg"))]
pub fn new_from_env() -> Result<DieselWorkflowStore, DomainError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("WORKFLOW_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                            .unwrap_or_else(|_| "insurance.db".into());
  if url.to_lowercase().starts_with("postgres") {
    return Err(DomainError::Storage("insurance-persistence se compiló sin la feature 'pg'; actívala para usar \
                                     Postgres"
                                              .into()));
  }
  DieselWorkflowStore::new(&url)
}

/// Almacenamiento SQLite sobre un fichero explícito, sin leer el entorno.
#[cfg(not(feature = "pg"))]
pub fn new_sqlite_for_test(path: &str) -> Result<DieselWorkflowStore, DomainError> {
  DieselWorkflowStore::new(path)
}
