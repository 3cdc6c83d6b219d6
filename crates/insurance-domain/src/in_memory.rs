// in_memory.rs
//
// Almacenamiento transaccional en memoria para pruebas y desarrollo.
//
// Las transacciones se serializan: solo puede haber un scope abierto a la
// vez (el resto espera en una condvar). Cada scope trabaja sobre una copia
// privada de las tablas que se publica en el commit; descartar el scope sin
// commit equivale a rollback.
use crate::application::Application;
use crate::catalog::{Product, Requisites};
use crate::document::{DocumentOwner, DocumentRecord};
use crate::domain_repository::{InsertOutcome, WorkflowScope};
use crate::identification::{IdentificationRecord, OutboxEntry};
use crate::insurance::{Beneficiary, Insurance};
use crate::person::{Passport, Person};
use crate::DomainError;
use flow::{FlowError, Transactional};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub id: Uuid,
    pub external_client_id: i64,
    pub profile: Person,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassportRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub passport: Passport,
}

/// Contenido completo del almacenamiento.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    pub products: HashMap<i64, Product>,
    pub providers: HashMap<String, i64>,
    pub application_types: HashMap<String, i64>,
    pub requisites: HashMap<String, (Uuid, Requisites)>,
    pub clients: Vec<ClientRecord>,
    pub persons: HashMap<Uuid, Person>,
    pub passports: Vec<PassportRecord>,
    pub identifications: Vec<IdentificationRecord>,
    pub references: HashMap<i64, Uuid>,
    pub documents: HashMap<Uuid, DocumentRecord>,
    pub document_links: Vec<(DocumentOwner, Uuid)>,
    pub beneficiaries: HashMap<Uuid, Beneficiary>,
    pub beneficiary_links: Vec<(Uuid, Uuid)>,
    pub insurances: HashMap<Uuid, Insurance>,
    pub applications: HashMap<Uuid, Application>,
    pub outbox: Vec<OutboxEntry>,
}

impl MemoryTables {
    /// Número total de filas escritas por los flujos (excluye catálogo).
    pub fn written_rows(&self) -> usize {
        self.requisites.len()
        + self.clients.len()
        + self.persons.len()
        + self.passports.len()
        + self.identifications.len()
        + self.references.len()
        + self.documents.len()
        + self.document_links.len()
        + self.beneficiaries.len()
        + self.beneficiary_links.len()
        + self.insurances.len()
        + self.applications.len()
        + self.outbox.len()
    }
}

#[derive(Debug, Default)]
struct Gate {
    busy: Mutex<bool>,
    released: Condvar,
}

impl Gate {
    fn acquire(self: &Arc<Self>) -> Result<GateTicket, FlowError> {
        let mut busy = self.busy
                           .lock()
                           .map_err(|e| FlowError::Storage(format!("Mutex 'gate' poisoned: {}", e)))?;
        while *busy {
            busy = self.released
                       .wait(busy)
                       .map_err(|e| FlowError::Storage(format!("Mutex 'gate' poisoned: {}", e)))?;
        }
        *busy = true;
        Ok(GateTicket(self.clone()))
    }
}

/// Turno exclusivo de transacción; se libera al soltarlo.
#[derive(Debug)]
struct GateTicket(Arc<Gate>);

impl Drop for GateTicket {
    fn drop(&mut self) {
        let mut busy = self.0.busy.lock().unwrap_or_else(|e| e.into_inner());
        *busy = false;
        self.0.released.notify_one();
    }
}

/// Transacción abierta sobre `InMemoryWorkflowStore`.
#[derive(Debug)]
pub struct InMemoryScope {
    tables: MemoryTables,
    failures: Arc<Mutex<HashSet<String>>>,
    _ticket: GateTicket,
}

/// Implementación en memoria de `Transactional` + `WorkflowScope`.
///
/// `fail_on(op)` hace fallar la operación indicada (nombre del método del
/// scope, o `"commit"`) para simular caídas del almacenamiento.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<Mutex<MemoryTables>>,
    gate: Arc<Gate>,
    failures: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, MemoryTables>, DomainError> {
        self.state
            .lock()
            .map_err(|e| DomainError::Storage(format!("Mutex 'state' poisoned: {}", e)))
    }

    pub fn with_product(self, product: Product) -> Self {
        if let Ok(mut s) = self.lock_state() {
            s.providers.entry(product.provider_code.clone()).or_insert(product.provider_id);
            s.products.insert(product.id, product);
        }
        self
    }

    pub fn with_provider(self, code: &str, id: i64) -> Self {
        if let Ok(mut s) = self.lock_state() {
            s.providers.insert(code.to_string(), id);
        }
        self
    }

    pub fn with_application_type(self, code: &str, id: i64) -> Self {
        if let Ok(mut s) = self.lock_state() {
            s.application_types.insert(code.to_string(), id);
        }
        self
    }

    /// Siembra una identificación ya existente (con su registro de cliente).
    pub fn with_identification(self, record: IdentificationRecord, profile: Person) -> Self {
        if let Ok(mut s) = self.lock_state() {
            if !s.clients.iter().any(|c| c.id == record.client_id) {
                s.clients.push(ClientRecord { id: record.client_id,
                                              external_client_id: record.external_client_id,
                                              profile: profile.profile() });
            }
            s.identifications.push(record);
        }
        self
    }

    /// Hace fallar la operación `op` en adelante.
    pub fn fail_on(&self, op: &str) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).insert(op.to_string());
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Copia del estado confirmado.
    pub fn snapshot(&self) -> Result<MemoryTables, DomainError> {
        Ok(self.lock_state()?.clone())
    }
}

impl Transactional for InMemoryWorkflowStore {
    type Scope = InMemoryScope;

    fn begin(&self) -> flow::Result<InMemoryScope> {
        let ticket = self.gate.acquire()?;
        let tables = self.state
                         .lock()
                         .map_err(|e| FlowError::Storage(format!("Mutex 'state' poisoned: {}", e)))?
                         .clone();
        Ok(InMemoryScope { tables, failures: self.failures.clone(), _ticket: ticket })
    }

    fn commit(&self, scope: InMemoryScope) -> flow::Result<()> {
        if scope.failing("commit") {
            return Err(FlowError::Storage("fallo simulado en 'commit'".into()));
        }
        let mut state = self.state
                            .lock()
                            .map_err(|e| FlowError::Storage(format!("Mutex 'state' poisoned: {}", e)))?;
        *state = scope.tables;
        Ok(())
    }

    fn rollback(&self, scope: InMemoryScope) -> flow::Result<()> {
        drop(scope);
        Ok(())
    }
}

impl InMemoryScope {
    fn failing(&self, op: &str) -> bool {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).contains(op)
    }

    fn check(&self, op: &str) -> Result<(), DomainError> {
        if self.failing(op) {
            return Err(DomainError::Storage(format!("fallo simulado en '{}'", op)));
        }
        Ok(())
    }

    /// Estado visible dentro de la transacción.
    pub fn tables(&self) -> &MemoryTables {
        &self.tables
    }
}

impl WorkflowScope for InMemoryScope {
    fn find_product(&mut self, id: i64) -> Result<Option<Product>, DomainError> {
        self.check("find_product")?;
        Ok(self.tables.products.get(&id).cloned())
    }

    fn find_provider_id(&mut self, code: &str) -> Result<Option<i64>, DomainError> {
        self.check("find_provider_id")?;
        Ok(self.tables.providers.get(code).copied())
    }

    fn find_application_type_id(&mut self, code: &str) -> Result<Option<i64>, DomainError> {
        self.check("find_application_type_id")?;
        Ok(self.tables.application_types.get(code).copied())
    }

    fn find_requisites_by_bic(&mut self, bic: &str) -> Result<Option<Uuid>, DomainError> {
        self.check("find_requisites_by_bic")?;
        Ok(self.tables.requisites.get(bic).map(|(id, _)| *id))
    }

    fn insert_requisites(&mut self, requisites: &Requisites) -> Result<InsertOutcome, DomainError> {
        self.check("insert_requisites")?;
        if self.tables.requisites.contains_key(&requisites.bic) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        let id = Uuid::new_v4();
        self.tables.requisites.insert(requisites.bic.clone(), (id, requisites.clone()));
        Ok(InsertOutcome::Inserted(id))
    }

    fn insert_client(&mut self, external_client_id: i64, person: &Person) -> Result<Uuid, DomainError> {
        self.check("insert_client")?;
        let id = Uuid::new_v4();
        self.tables.clients.push(ClientRecord { id, external_client_id, profile: person.profile() });
        self.insert_passport(id, &person.passport)?;
        Ok(id)
    }

    fn insert_person(&mut self, person: &Person) -> Result<Uuid, DomainError> {
        self.check("insert_person")?;
        let id = Uuid::new_v4();
        self.tables.persons.insert(id, person.profile());
        Ok(id)
    }

    fn insert_passport(&mut self, owner_id: Uuid, passport: &Passport) -> Result<Uuid, DomainError> {
        self.check("insert_passport")?;
        let id = Uuid::new_v4();
        self.tables.passports.push(PassportRecord { id, owner_id, passport: passport.clone() });
        Ok(id)
    }

    fn find_identification(&mut self,
                           external_client_id: i64,
                           provider: &str)
                           -> Result<Option<IdentificationRecord>, DomainError> {
        self.check("find_identification")?;
        Ok(self.tables
               .identifications
               .iter()
               .rev()
               .find(|r| r.external_client_id == external_client_id && r.provider == provider)
               .cloned())
    }

    fn find_identification_by_id(&mut self, id: Uuid) -> Result<Option<IdentificationRecord>, DomainError> {
        self.check("find_identification_by_id")?;
        Ok(self.tables.identifications.iter().find(|r| r.id == id).cloned())
    }

    fn insert_identification(&mut self, record: &IdentificationRecord) -> Result<(), DomainError> {
        self.check("insert_identification")?;
        self.tables.identifications.push(record.clone());
        Ok(())
    }

    fn insert_reference(&mut self, reference_id: i64, identification_id: Uuid) -> Result<InsertOutcome, DomainError> {
        self.check("insert_reference")?;
        if self.tables.references.contains_key(&reference_id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        self.tables.references.insert(reference_id, identification_id);
        Ok(InsertOutcome::Inserted(identification_id))
    }

    fn references_of(&mut self, identification_id: Uuid) -> Result<Vec<i64>, DomainError> {
        self.check("references_of")?;
        let mut refs: Vec<i64> = self.tables
                                     .references
                                     .iter()
                                     .filter(|(_, id)| **id == identification_id)
                                     .map(|(r, _)| *r)
                                     .collect();
        refs.sort_unstable();
        Ok(refs)
    }

    fn insert_documents(&mut self, records: &[DocumentRecord]) -> Result<(), DomainError> {
        self.check("insert_documents")?;
        for r in records {
            self.tables.documents.insert(r.id, r.clone());
        }
        Ok(())
    }

    fn link_documents(&mut self, owner: DocumentOwner, document_ids: &[Uuid]) -> Result<(), DomainError> {
        self.check("link_documents")?;
        for id in document_ids {
            if !self.tables.documents.contains_key(id) {
                return Err(DomainError::Storage(format!("documento {} inexistente", id)));
            }
            if !self.tables.document_links.contains(&(owner, *id)) {
                self.tables.document_links.push((owner, *id));
            }
        }
        Ok(())
    }

    fn client_document_ids(&mut self, external_client_id: i64) -> Result<Vec<Uuid>, DomainError> {
        self.check("client_document_ids")?;
        let clients: HashSet<Uuid> = self.tables
                                         .clients
                                         .iter()
                                         .filter(|c| c.external_client_id == external_client_id)
                                         .map(|c| c.id)
                                         .collect();
        let mut out = Vec::new();
        for (owner, doc) in &self.tables.document_links {
            if let DocumentOwner::Client(cid) = owner {
                if clients.contains(cid) && !out.contains(doc) {
                    out.push(*doc);
                }
            }
        }
        Ok(out)
    }

    fn document_ids_of(&mut self, owner: DocumentOwner) -> Result<Vec<Uuid>, DomainError> {
        self.check("document_ids_of")?;
        Ok(self.tables
               .document_links
               .iter()
               .filter(|(o, _)| *o == owner)
               .map(|(_, d)| *d)
               .collect())
    }

    fn insert_beneficiaries(&mut self, beneficiaries: &[Beneficiary]) -> Result<Vec<Uuid>, DomainError> {
        self.check("insert_beneficiaries")?;
        let mut ids = Vec::with_capacity(beneficiaries.len());
        for b in beneficiaries {
            let id = Uuid::new_v4();
            self.tables.beneficiaries.insert(id, b.clone());
            ids.push(id);
        }
        Ok(ids)
    }

    fn link_beneficiaries(&mut self, insurance_id: Uuid, beneficiary_ids: &[Uuid]) -> Result<(), DomainError> {
        self.check("link_beneficiaries")?;
        for id in beneficiary_ids {
            self.tables.beneficiary_links.push((insurance_id, *id));
        }
        Ok(())
    }

    fn beneficiaries_of(&mut self, insurance_id: Uuid) -> Result<Vec<Beneficiary>, DomainError> {
        self.check("beneficiaries_of")?;
        Ok(self.tables
               .beneficiary_links
               .iter()
               .filter(|(ins, _)| *ins == insurance_id)
               .filter_map(|(_, b)| self.tables.beneficiaries.get(b).cloned())
               .collect())
    }

    fn insert_insurance(&mut self, insurance: &Insurance) -> Result<(), DomainError> {
        self.check("insert_insurance")?;
        self.tables.insurances.insert(insurance.id, insurance.clone());
        Ok(())
    }

    fn find_insurance(&mut self, id: Uuid) -> Result<Option<Insurance>, DomainError> {
        self.check("find_insurance")?;
        Ok(self.tables.insurances.get(&id).cloned())
    }

    fn insert_application(&mut self, application: &Application) -> Result<(), DomainError> {
        self.check("insert_application")?;
        self.tables.applications.insert(application.id, application.clone());
        Ok(())
    }

    fn find_application(&mut self, id: Uuid) -> Result<Option<Application>, DomainError> {
        self.check("find_application")?;
        Ok(self.tables.applications.get(&id).cloned())
    }

    fn insert_outbox(&mut self, entry: &OutboxEntry) -> Result<(), DomainError> {
        self.check("insert_outbox")?;
        self.tables.outbox.push(entry.clone());
        Ok(())
    }
}
