use crate::models::User;
use auth_data::entities::UserEntity;

pub fn user_entity_to_user(user: UserEntity) -> User {
    User {
        id: user.id_hex(),
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        phone_number: user.phone_number,
        colour: user.colour,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}
