use crate::catalog::Product;
use crate::in_memory::InMemoryWorkflowStore;

pub struct DomainStubs;

impl DomainStubs {
    /// Producto activo de ejemplo del proveedor `acme` (id 10).
    pub fn sample_product() -> Product {
        Product { id: 1,
                  provider_id: 10,
                  provider_code: "acme".to_string(),
                  currency: "RUB".to_string(),
                  min_sum: 10_000.0,
                  max_sum: 1_000_000.0,
                  active: true }
    }

    /// Crea un almacenamiento en memoria con un catálogo de ejemplo: un
    /// producto activo, uno inactivo, dos proveedores y los tipos de
    /// solicitud más comunes.
    pub fn sample_store() -> InMemoryWorkflowStore {
        let inactive = Product { id: 2, active: false, ..Self::sample_product() };
        InMemoryWorkflowStore::new().with_product(Self::sample_product())
                                    .with_product(inactive)
                                    .with_provider("globex", 20)
                                    .with_application_type("claim", 1)
                                    .with_application_type("termination", 2)
                                    .with_application_type("beneficiary_change", 3)
    }
}
