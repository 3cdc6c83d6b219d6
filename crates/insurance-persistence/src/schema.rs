// Esquema Diesel de las tablas del motor de seguros.
// Ids como Text (uuid), marcas de tiempo como BigInt (microsegundos UTC) y
// fechas como Text ISO-8601 para compartir el mismo esquema entre SQLite y
// Postgres.
use diesel::allow_tables_to_appear_in_same_query;

diesel::table! {
    providers (id) {
        id -> BigInt,
        code -> Text,
    }
}

diesel::table! {
    products (id) {
        id -> BigInt,
        provider_id -> BigInt,
        currency -> Text,
        min_sum -> Double,
        max_sum -> Double,
        active -> Bool,
    }
}

diesel::table! {
    application_types (id) {
        id -> BigInt,
        code -> Text,
    }
}

diesel::table! {
    requisites (id) {
        id -> Text,
        bic -> Text,
        bank_name -> Text,
        account -> Text,
        corr_account -> Text,
    }
}

diesel::table! {
    clients (id) {
        id -> Text,
        external_client_id -> BigInt,
        profile -> Text,
        created_at_ts -> BigInt,
    }
}

diesel::table! {
    persons (id) {
        id -> Text,
        name -> Text,
        surname -> Text,
        birth_date -> Text,
        profile -> Text,
    }
}

diesel::table! {
    passports (id) {
        id -> Text,
        owner_id -> Text,
        series -> Text,
        number -> Text,
        issued_by -> Text,
        issue_date -> Text,
        department_code -> Text,
    }
}

diesel::table! {
    identifications (id) {
        id -> Text,
        client_id -> Text,
        external_client_id -> BigInt,
        provider_id -> BigInt,
        provider -> Text,
        status -> Text,
        created_at_ts -> BigInt,
    }
}

diesel::table! {
    identification_references (reference_id) {
        reference_id -> BigInt,
        identification_id -> Text,
    }
}

diesel::table! {
    documents (id) {
        id -> Text,
        name -> Text,
        storage_key -> Text,
        content_type -> Text,
        doc_type -> Text,
        created_at_ts -> BigInt,
    }
}

diesel::table! {
    document_links (owner_kind, owner_id, document_id) {
        owner_kind -> Text,
        owner_id -> Text,
        document_id -> Text,
        linked_at_ts -> BigInt,
    }
}

diesel::table! {
    beneficiaries (id) {
        id -> Text,
        name -> Text,
        surname -> Text,
        patronymic -> Nullable<Text>,
        birth_date -> Text,
        share -> Double,
        relation -> Text,
        position -> Integer,
    }
}

diesel::table! {
    insurance_beneficiaries (insurance_id, beneficiary_id) {
        insurance_id -> Text,
        beneficiary_id -> Text,
    }
}

diesel::table! {
    insurances (id) {
        id -> Text,
        requisites_id -> Text,
        insured_person_id -> Nullable<Text>,
        status -> Text,
        currency -> Text,
        duration_years -> Integer,
        client_id -> BigInt,
        customer_id -> Text,
        insurance_sum -> Double,
        contract_number -> Text,
        product_id -> BigInt,
        provider_id -> BigInt,
        created_at_ts -> BigInt,
    }
}

diesel::table! {
    applications (id) {
        id -> Text,
        insurance_id -> Text,
        application_type_id -> BigInt,
        status -> Text,
        created_at_ts -> BigInt,
    }
}

diesel::table! {
    outbox (id) {
        id -> Text,
        reference_id -> BigInt,
        event -> Text,
        created_at_ts -> BigInt,
    }
}

allow_tables_to_appear_in_same_query!(providers,
                                      products,
                                      application_types,
                                      requisites,
                                      clients,
                                      persons,
                                      passports,
                                      identifications,
                                      identification_references,
                                      documents,
                                      document_links,
                                      beneficiaries,
                                      insurance_beneficiaries,
                                      insurances,
                                      applications,
                                      outbox);
