/// Declares a record struct and implements [`Record`](crate::Record) for it.
///
/// The table is named after the struct and each column after its field, in
/// declaration order. The first field is the primary key: its name must
/// contain `id` and its type must be `Copy + Into<i64>`.
///
/// Field order is the column order of the table. Rows are read with
/// `SELECT *` and mapped by position, so a table whose columns are declared
/// in another order maps values into the wrong fields.
///
/// ```
/// autofactory_core::entity! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct Person {
///         pub ID: i64,
///         pub Name: String,
///         pub Age: i64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(#[$key_meta:meta])*
            $key_vis:vis $key:ident : $key_ty:ty
            $(,
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
            )* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[allow(non_snake_case)]
        $vis struct $name {
            $(#[$key_meta])*
            $key_vis $key: $key_ty,
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Record for $name {
            const TABLE_NAME: &'static str = stringify!($name);
            const COLUMNS: &'static [$crate::ColumnDescriptor] = &[
                $crate::ColumnDescriptor::new(stringify!($key), stringify!($key_ty)),
                $($crate::ColumnDescriptor::new(stringify!($field), stringify!($field_ty)),)*
            ];

            fn key(&self) -> i64 {
                ::core::convert::Into::<i64>::into(self.$key)
            }

            fn values(&self) -> ::std::vec::Vec<&dyn $crate::rusqlite::ToSql> {
                ::std::vec![
                    &self.$key as &dyn $crate::rusqlite::ToSql,
                    $(&self.$field as &dyn $crate::rusqlite::ToSql,)*
                ]
            }

            #[allow(unused_mut, unused_assignments)]
            fn assign(
                &mut self,
                ordinal: usize,
                value: $crate::rusqlite::types::ValueRef<'_>,
            ) -> $crate::rusqlite::types::FromSqlResult<()> {
                let mut position = 0usize;
                if ordinal == position {
                    self.$key = $crate::rusqlite::types::FromSql::column_result(value)?;
                    return Ok(());
                }
                $(
                    position += 1;
                    if ordinal == position {
                        self.$field = $crate::rusqlite::types::FromSql::column_result(value)?;
                        return Ok(());
                    }
                )*
                Err($crate::rusqlite::types::FromSqlError::OutOfRange(ordinal as i64))
            }
        }
    };
}
