use crate::application::Application;
use crate::catalog::{Product, Requisites};
use crate::document::{DocumentOwner, DocumentRecord};
use crate::identification::{IdentificationRecord, OutboxEntry};
use crate::insurance::{Beneficiary, Insurance};
use crate::person::{Passport, Person};
use crate::DomainError;
use uuid::Uuid;

/// Resultado de un insert respaldado por una restricción de unicidad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// La fila se creó con este id.
    Inserted(Uuid),
    /// Otra transacción ya insertó la misma clave natural.
    AlreadyExists,
}

/// Operaciones por entidad disponibles dentro de una transacción abierta.
///
/// Todas las escrituras hechas a través de un scope se confirman o se
/// descartan juntas. Las búsquedas devuelven `Option` para distinguir
/// "no existe" de un fallo de almacenamiento.
pub trait WorkflowScope: Send {
    // catálogo
    fn find_product(&mut self, id: i64) -> Result<Option<Product>, DomainError>;
    /// Id numérico del proveedor a partir de su código.
    fn find_provider_id(&mut self, code: &str) -> Result<Option<i64>, DomainError>;
    fn find_application_type_id(&mut self, code: &str) -> Result<Option<i64>, DomainError>;

    // requisitos bancarios
    fn find_requisites_by_bic(&mut self, bic: &str) -> Result<Option<Uuid>, DomainError>;
    /// Inserta si el BIC no existe (`ON CONFLICT DO NOTHING`).
    fn insert_requisites(&mut self, requisites: &Requisites) -> Result<InsertOutcome, DomainError>;

    // clientes, personas y pasaportes
    /// Crea el registro interno del cliente junto con su pasaporte.
    fn insert_client(&mut self, external_client_id: i64, person: &Person) -> Result<Uuid, DomainError>;
    fn insert_person(&mut self, person: &Person) -> Result<Uuid, DomainError>;
    fn insert_passport(&mut self, owner_id: Uuid, passport: &Passport) -> Result<Uuid, DomainError>;

    // identificaciones
    /// Identificación más reciente del cliente ante el proveedor.
    fn find_identification(&mut self,
                           external_client_id: i64,
                           provider: &str)
                           -> Result<Option<IdentificationRecord>, DomainError>;
    fn find_identification_by_id(&mut self, id: Uuid) -> Result<Option<IdentificationRecord>, DomainError>;
    fn insert_identification(&mut self, record: &IdentificationRecord) -> Result<(), DomainError>;
    /// Vincula una referencia externa a una identificación. La referencia es
    /// única: si ya estaba vinculada devuelve `AlreadyExists`.
    fn insert_reference(&mut self, reference_id: i64, identification_id: Uuid) -> Result<InsertOutcome, DomainError>;
    fn references_of(&mut self, identification_id: Uuid) -> Result<Vec<i64>, DomainError>;

    // documentos
    fn insert_documents(&mut self, records: &[DocumentRecord]) -> Result<(), DomainError>;
    /// Vincula documentos a un dueño; vincular dos veces el mismo par no
    /// duplica la relación.
    fn link_documents(&mut self, owner: DocumentOwner, document_ids: &[Uuid]) -> Result<(), DomainError>;
    /// Documentos previos de todos los registros de cliente con ese id
    /// externo. Sin documentos no es un error.
    fn client_document_ids(&mut self, external_client_id: i64) -> Result<Vec<Uuid>, DomainError>;
    fn document_ids_of(&mut self, owner: DocumentOwner) -> Result<Vec<Uuid>, DomainError>;

    // beneficiarios y pólizas
    fn insert_beneficiaries(&mut self, beneficiaries: &[Beneficiary]) -> Result<Vec<Uuid>, DomainError>;
    fn link_beneficiaries(&mut self, insurance_id: Uuid, beneficiary_ids: &[Uuid]) -> Result<(), DomainError>;
    fn beneficiaries_of(&mut self, insurance_id: Uuid) -> Result<Vec<Beneficiary>, DomainError>;
    fn insert_insurance(&mut self, insurance: &Insurance) -> Result<(), DomainError>;
    fn find_insurance(&mut self, id: Uuid) -> Result<Option<Insurance>, DomainError>;

    // solicitudes
    fn insert_application(&mut self, application: &Application) -> Result<(), DomainError>;
    fn find_application(&mut self, id: Uuid) -> Result<Option<Application>, DomainError>;

    // outbox
    fn insert_outbox(&mut self, entry: &OutboxEntry) -> Result<(), DomainError>;
}
