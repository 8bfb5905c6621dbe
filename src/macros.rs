/// Genera el enum de palabras clave junto a su tabla de superficie.
///
/// Cada entrada asocia una variante con el texto exacto que la
/// produce en el código fuente. La misma tabla alimenta tanto la
/// búsqueda del lexer como el `Display` de diagnósticos, por lo cual
/// ambas direcciones no pueden divergir.
macro_rules! keywords {
    ($($(#[$meta:meta])* $variant:ident => $text:literal,)*) => {
        /// Una palabra clave.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($(#[$meta])* $variant,)*
        }

        impl Keyword {
            /// Todas las palabras clave con su texto de superficie.
            pub const ALL: &'static [(&'static str, Keyword)] = &[
                $(($text, Keyword::$variant),)*
            ];

            /// Texto de superficie de la palabra clave.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text,)*
                }
            }
        }
    };
}
