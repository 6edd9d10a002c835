//! Diesel schema for dispatch persistence.

diesel::table! {
    /// Customer work orders.
    tasks (id) {
        /// Task identifier.
        id -> Int8,
        /// Human-readable code, unique when present.
        #[max_length = 64]
        code -> Nullable<Varchar>,
        /// Two-digit task type code.
        #[max_length = 2]
        task_type -> Varchar,
        /// Customer the work is for.
        customer_id -> Int8,
        /// Task lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// First free-form payload.
        data1 -> Nullable<Text>,
        /// Second free-form payload.
        data2 -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stages of field work within a task.
    sub_tasks (id) {
        /// Sub-task identifier.
        id -> Int8,
        /// Stable external identifier.
        uid -> Uuid,
        /// Parent task.
        task_id -> Int8,
        /// Full sub-task kind code.
        #[max_length = 10]
        kind -> Varchar,
        /// Human-readable code.
        #[max_length = 64]
        code -> Nullable<Varchar>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Snapshot of the last field executor.
        last_field_executor -> Nullable<Jsonb>,
        /// Snapshot of the last field supervisor.
        last_field_supervisor -> Nullable<Jsonb>,
        /// Snapshot of the last back-office verifier.
        last_cgp -> Nullable<Jsonb>,
        /// Number of times the sub-task entered fixing.
        fix_count -> Int4,
        /// Working was finished at least once.
        is_working_finish -> Bool,
        /// Latest supervisor verification passed.
        is_verification_success -> Bool,
        /// Latest back-office verification passed.
        is_cgp_verification_success -> Bool,
        /// Reference to the latest report.
        last_report -> Nullable<Jsonb>,
        /// Reference to the report holding the form data.
        last_form_report -> Nullable<Jsonb>,
        /// Milestone timestamps and report references.
        milestones -> Jsonb,
    }
}

diesel::table! {
    /// Reports submitted with transitions.
    sub_task_reports (id) {
        /// Report identifier.
        id -> Int8,
        /// Report uid.
        uid -> Uuid,
        /// Human-readable code.
        #[max_length = 64]
        code -> Nullable<Varchar>,
        /// Sub-task the report belongs to.
        sub_task_id -> Int8,
        /// Denormalized sub-task uid.
        sub_task_uid -> Uuid,
        /// Status entered by the transition.
        #[max_length = 50]
        status -> Varchar,
        /// Transition time.
        at -> Timestamptz,
        /// Snapshot of the reporting actor.
        actor -> Jsonb,
        /// Contact number of the reporting actor.
        #[max_length = 32]
        phone_number -> Nullable<Varchar>,
        /// Snapshot of the reporting organization.
        organization -> Nullable<Jsonb>,
        /// Free-form report data.
        payload -> Jsonb,
    }
}

diesel::table! {
    /// Append-only audit trail of sub-task transitions.
    sub_task_history_items (id) {
        /// Row identifier.
        id -> Int8,
        /// Sub-task that transitioned.
        sub_task_id -> Int8,
        /// Status before the transition.
        #[max_length = 50]
        from_status -> Varchar,
        /// Status after the transition.
        #[max_length = 50]
        to_status -> Varchar,
        /// Transition time.
        at -> Timestamptz,
        /// Snapshot of the acting user.
        actor -> Jsonb,
        /// Snapshot of the acting organization.
        organization -> Nullable<Jsonb>,
        /// Operation name.
        #[max_length = 100]
        operation -> Varchar,
        /// Reference to the report created by the transition.
        report -> Nullable<Jsonb>,
    }
}

diesel::table! {
    /// Meter records keyed by customer.
    customer_meters (customer_id) {
        /// Owning customer.
        customer_id -> Int8,
        /// Merged meter data.
        meter -> Jsonb,
    }
}

diesel::joinable!(sub_tasks -> tasks (task_id));
diesel::joinable!(sub_task_reports -> sub_tasks (sub_task_id));
diesel::joinable!(sub_task_history_items -> sub_tasks (sub_task_id));

diesel::allow_tables_to_appear_in_same_query!(
    tasks,
    sub_tasks,
    sub_task_reports,
    sub_task_history_items,
    customer_meters,
);
