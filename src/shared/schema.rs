diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        first_name_position -> Varchar,
        campaigns_per_page -> Nullable<Int8>,
        campaigns_sort_by -> Nullable<Varchar>,
        leads_per_page -> Nullable<Int8>,
        leads_sort_by -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    campaigns (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        assigned_to -> Nullable<Uuid>,
        name -> Varchar,
        access -> Varchar,
        status -> Nullable<Varchar>,
        budget -> Nullable<Numeric>,
        target_leads -> Nullable<Int4>,
        target_conversion -> Nullable<Float8>,
        target_revenue -> Nullable<Numeric>,
        leads_count -> Int4,
        opportunities_count -> Int4,
        revenue -> Nullable<Numeric>,
        starts_on -> Nullable<Date>,
        ends_on -> Nullable<Date>,
        objectives -> Nullable<Text>,
        background_info -> Nullable<Varchar>,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    leads (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        campaign_id -> Nullable<Uuid>,
        assigned_to -> Nullable<Uuid>,
        first_name -> Varchar,
        last_name -> Varchar,
        access -> Varchar,
        title -> Nullable<Varchar>,
        company -> Nullable<Varchar>,
        source -> Nullable<Varchar>,
        status -> Nullable<Varchar>,
        referred_by -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        alt_email -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        mobile -> Nullable<Varchar>,
        blog -> Nullable<Varchar>,
        linkedin -> Nullable<Varchar>,
        facebook -> Nullable<Varchar>,
        twitter -> Nullable<Varchar>,
        rating -> Int4,
        do_not_call -> Bool,
        background_info -> Nullable<Varchar>,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    accounts (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        assigned_to -> Nullable<Uuid>,
        name -> Varchar,
        access -> Varchar,
        website -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        background_info -> Nullable<Varchar>,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    opportunities (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        campaign_id -> Nullable<Uuid>,
        assigned_to -> Nullable<Uuid>,
        account_id -> Nullable<Uuid>,
        contact_id -> Nullable<Uuid>,
        name -> Varchar,
        access -> Varchar,
        source -> Nullable<Varchar>,
        stage -> Nullable<Varchar>,
        probability -> Nullable<Int4>,
        amount -> Nullable<Numeric>,
        discount -> Nullable<Numeric>,
        closes_on -> Nullable<Date>,
        background_info -> Nullable<Varchar>,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    contacts (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        lead_id -> Nullable<Uuid>,
        account_id -> Nullable<Uuid>,
        assigned_to -> Nullable<Uuid>,
        first_name -> Varchar,
        last_name -> Varchar,
        access -> Varchar,
        title -> Nullable<Varchar>,
        source -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        alt_email -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        mobile -> Nullable<Varchar>,
        blog -> Nullable<Varchar>,
        linkedin -> Nullable<Varchar>,
        facebook -> Nullable<Varchar>,
        twitter -> Nullable<Varchar>,
        do_not_call -> Bool,
        background_info -> Nullable<Varchar>,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    permissions (id) {
        id -> Uuid,
        user_id -> Uuid,
        asset_type -> Varchar,
        asset_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        assigned_to -> Nullable<Uuid>,
        name -> Varchar,
        asset_type -> Nullable<Varchar>,
        asset_id -> Nullable<Uuid>,
        priority -> Nullable<Varchar>,
        category -> Nullable<Varchar>,
        due_at -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    activities (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        subject_type -> Varchar,
        subject_id -> Uuid,
        action -> Varchar,
        info -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    comments (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        commentable_type -> Varchar,
        commentable_id -> Uuid,
        comment -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    addresses (id) {
        id -> Uuid,
        addressable_type -> Varchar,
        addressable_id -> Uuid,
        street1 -> Nullable<Varchar>,
        street2 -> Nullable<Varchar>,
        city -> Nullable<Varchar>,
        state -> Nullable<Varchar>,
        zipcode -> Nullable<Varchar>,
        country -> Nullable<Varchar>,
        full_address -> Nullable<Varchar>,
        address_type -> Varchar,
        deleted_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    campaigns,
    leads,
    accounts,
    opportunities,
    contacts,
    permissions,
    tasks,
    activities,
    comments,
    addresses,
);
